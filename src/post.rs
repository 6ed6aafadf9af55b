//! Blog post assembly: slug, filename, front matter and persistence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Mail2BlogError, Result};

/// A post ready to be written to the site's post directory.
#[derive(Debug, Clone)]
pub struct BlogPost {
    pub title: String,
    pub author: String,
    pub date: DateTime<Utc>,
    /// Front-matter layout tag.
    pub layout: String,
    /// Optional category list, order-preserving.
    pub categories: Vec<String>,
    /// Optional tag list, order-preserving.
    pub tags: Vec<String>,
    /// Markdown body.
    pub body: String,
}

impl BlogPost {
    /// Create a post with the default `post` layout and no categories or tags.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        date: DateTime<Utc>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            date,
            layout: "post".to_string(),
            categories: Vec::new(),
            tags: Vec::new(),
            body: body.into(),
        }
    }

    /// Filename in the `YYYY-MM-DD-{slug}.md` form.
    ///
    /// Two posts on the same day with the same slug collide; the later
    /// write wins.
    pub fn filename(&self) -> String {
        format!("{}-{}.md", self.date.format("%Y-%m-%d"), slugify(&self.title))
    }

    /// Build the YAML front matter block, `---` delimited.
    ///
    /// Field order is fixed; `categories` and `tags` are emitted only when
    /// non-empty.
    fn front_matter(&self) -> String {
        let mut fm = vec![
            "---".to_string(),
            format!("layout: {}", self.layout),
            format!("title: \"{}\"", self.title),
            format!("author: \"{}\"", self.author),
            format!("date: {}", self.date.format("%Y-%m-%d %H:%M:%S")),
        ];
        if !self.categories.is_empty() {
            fm.push(format!("categories: [{}]", self.categories.join(", ")));
        }
        if !self.tags.is_empty() {
            fm.push(format!("tags: [{}]", self.tags.join(", ")));
        }
        fm.push("---\n".to_string());
        fm.join("\n")
    }

    /// Front matter followed by the body.
    pub fn assemble(&self) -> String {
        format!("{}{}", self.front_matter(), self.body)
    }

    /// Write the assembled post into `directory` and return the final path.
    ///
    /// A leading `~` in `directory` is expanded to the home directory. An
    /// existing file at the target path is overwritten without any check.
    pub fn persist(&self, directory: &Path) -> Result<PathBuf> {
        let directory = expand_home(directory);
        std::fs::create_dir_all(&directory).map_err(|e| Mail2BlogError::io(&directory, e))?;

        let path = directory.join(self.filename());
        std::fs::write(&path, self.assemble()).map_err(|e| Mail2BlogError::io(&path, e))?;
        Ok(path)
    }
}

/// Generate a URL-friendly slug from a title.
///
/// Lower-cased, every run of non-alphanumeric characters collapsed to a
/// single hyphen, leading and trailing hyphens trimmed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Expand a leading `~` component to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
