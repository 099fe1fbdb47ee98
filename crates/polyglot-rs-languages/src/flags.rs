//! Flag resolution.
//!
//! A language has a *bundled* flag looked up by flag code (`fr.png`) and an
//! optional *custom* flag looked up by locale (`fr_FR.png`, `.jpg`, `.svg`)
//! in the installation-local directory, then the active theme, then the
//! parent theme. The first match wins.
//!
//! File-system facts come from an [`AssetLocator`]; everything else here is
//! pure computation over what the locator reports.

use std::collections::HashMap;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use polyglot_rs_core::settings::FlagSettings;
use serde::{Deserialize, Serialize};

/// Where a flag file may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagSource {
    Bundled,
    Local,
    Theme,
    ParentTheme,
}

/// Directory precedence for custom flags.
pub const CUSTOM_FLAG_SOURCES: [FlagSource; 3] =
    [FlagSource::Local, FlagSource::Theme, FlagSource::ParentTheme];

/// Extensions tried, in order, for custom flags.
pub const CUSTOM_FLAG_EXTENSIONS: [&str; 3] = ["png", "jpg", "svg"];

/// A flag file found by an [`AssetLocator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Public URL of the file.
    pub url: String,
    /// File contents, when the locator was asked for them.
    pub contents: Option<Vec<u8>>,
}

/// Answers "does this flag file exist, and where is it served from?".
pub trait AssetLocator: Send + Sync {
    /// Looks `file_name` up in `source`. Contents are read only when
    /// `with_contents` is set.
    fn locate(&self, source: FlagSource, file_name: &str, with_contents: bool) -> Option<AssetFile>;
}

/// An [`AssetLocator`] over the directories named in [`FlagSettings`].
#[derive(Debug, Clone, Default)]
pub struct FsAssetLocator {
    dirs: HashMap<FlagSource, (PathBuf, String)>,
}

impl FsAssetLocator {
    pub fn from_settings(settings: &FlagSettings) -> Self {
        let mut dirs = HashMap::new();
        let entries = [
            (FlagSource::Bundled, &settings.bundled_dir, &settings.bundled_url),
            (FlagSource::Local, &settings.local_dir, &settings.local_url),
            (FlagSource::Theme, &settings.theme_dir, &settings.theme_url),
            (
                FlagSource::ParentTheme,
                &settings.parent_theme_dir,
                &settings.parent_theme_url,
            ),
        ];
        for (source, dir, url) in entries {
            if let Some(dir) = dir {
                dirs.insert(source, (dir.clone(), url.clone()));
            }
        }
        Self { dirs }
    }
}

impl AssetLocator for FsAssetLocator {
    fn locate(&self, source: FlagSource, file_name: &str, with_contents: bool) -> Option<AssetFile> {
        let (dir, base_url) = self.dirs.get(&source)?;
        let path = dir.join(file_name);
        if !path.is_file() {
            return None;
        }
        let contents = if with_contents {
            match std::fs::read(&path) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "unreadable flag file");
                    return None;
                }
            }
        } else {
            None
        };
        Some(AssetFile {
            url: format!("{}/{file_name}", base_url.trim_end_matches('/')),
            contents,
        })
    }
}

/// A locator that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetLocator for NoAssets {
    fn locate(&self, _: FlagSource, _: &str, _: bool) -> Option<AssetFile> {
        None
    }
}

/// A resolved flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    /// Public URL of the image, empty when there is none.
    pub url: String,
    /// What goes in `src`: a `data:` URI when inlined, otherwise the URL.
    pub src: String,
    /// Alternative text; defaults to the language name.
    pub title: String,
}

impl Flag {
    /// Returns `true` if no image was found.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

fn to_flag(file: AssetFile, file_name: &str, title: &str, inline: bool) -> Flag {
    let src = match (&file.contents, inline) {
        (Some(bytes), true) => format!("data:{};base64,{}", mime_for(file_name), STANDARD.encode(bytes)),
        _ => file.url.clone(),
    };
    Flag {
        url: file.url,
        src,
        title: title.to_string(),
    }
}

/// Resolves the bundled flag of `code`. Returns an empty flag (still
/// titled) when the code is empty or unknown to the locator.
pub fn bundled_flag(locator: &dyn AssetLocator, code: &str, title: &str, inline: bool) -> Flag {
    if code.is_empty() {
        return Flag {
            title: title.to_string(),
            ..Flag::default()
        };
    }
    let file_name = format!("{code}.png");
    locator
        .locate(FlagSource::Bundled, &file_name, inline)
        .map_or_else(
            || Flag {
                title: title.to_string(),
                ..Flag::default()
            },
            |file| to_flag(file, &file_name, title, inline),
        )
}

/// Resolves the custom flag of `locale`, if any directory provides one.
pub fn custom_flag(
    locator: &dyn AssetLocator,
    locale: &str,
    title: &str,
    inline: bool,
) -> Option<Flag> {
    if locale.is_empty() {
        return None;
    }
    for source in CUSTOM_FLAG_SOURCES {
        for ext in CUSTOM_FLAG_EXTENSIONS {
            let file_name = format!("{locale}.{ext}");
            if let Some(file) = locator.locate(source, &file_name, inline) {
                return Some(to_flag(file, &file_name, title, inline));
            }
        }
    }
    None
}

/// Returns `true` if a bundled flag exists for `code`.
pub fn has_bundled_flag(locator: &dyn AssetLocator, code: &str) -> bool {
    !code.is_empty()
        && locator
            .locate(FlagSource::Bundled, &format!("{code}.png"), false)
            .is_some()
}
