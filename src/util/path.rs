use std::path::{Component, Path};

pub trait PathExt {
    /// Join the normal components of a relative path with `/`, dropping the
    /// final component's extension.
    fn to_category_key(&self) -> String;
}

impl PathExt for Path {
    fn to_category_key(&self) -> String {
        let mut parts: Vec<String> = self
            .parent()
            .map(|dir| {
                dir.components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(stem) = self.file_stem() {
            parts.push(stem.to_string_lossy().into_owned());
        }
        parts.join("/")
    }
}
