//! Reading, writing and interactively filling out the `Datafile`.

use std::path::Path;

use data_schema::{Descriptor, Handle, ident_string};

use crate::error::{DataError, Result};
use crate::io::write_atomic;

/// Load the Datafile at `path`.
pub fn load(path: &Path) -> Result<Descriptor> {
    let content = std::fs::read_to_string(path).map_err(|e| DataError::io_at(path, e))?;
    if content.trim().is_empty() {
        return Ok(Descriptor::default());
    }
    serde_yaml::from_str(&content).map_err(|e| DataError::yaml(path.display().to_string(), e))
}

/// Load the Datafile at `path`, or an empty descriptor if it cannot be read.
pub fn load_or_default(path: &Path) -> Descriptor {
    match load(path) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!("no usable Datafile at {}: {}", path.display(), e);
            Descriptor::default()
        }
    }
}

pub fn save(path: &Path, descriptor: &Descriptor) -> Result<()> {
    let yaml = serde_yaml::to_string(descriptor).map_err(|e| DataError::yaml("Datafile", e))?;
    write_atomic(path, yaml.as_bytes())
}

/// A Datafile field that can be filled out by a [`Prompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Name,
    Version,
    Tagline,
    Description,
    License,
}

impl Field {
    pub const ALL: [Self; 6] = [
        Self::Author,
        Self::Name,
        Self::Version,
        Self::Tagline,
        Self::Description,
        Self::License,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Author => "author id",
            Self::Name => "dataset id",
            Self::Version => "dataset version",
            Self::Tagline => "tagline description (<80 chars)",
            Self::Description => "long description",
            Self::License => "license name",
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            Self::Author | Self::Name | Self::Version | Self::Tagline
        )
    }

    fn get(self, d: &Descriptor) -> String {
        let h = d.handle();
        match self {
            Self::Author => h.author,
            Self::Name => h.name,
            Self::Version => h.version,
            Self::Tagline => d.tagline.clone(),
            Self::Description => d.description.clone(),
            Self::License => d.license.clone(),
        }
    }

    fn set(self, d: &mut Descriptor, value: String) {
        match self {
            Self::Tagline => d.tagline = value,
            Self::Description => d.description = value,
            Self::License => d.license = value,
            Self::Author | Self::Name | Self::Version => {
                let h = d.handle();
                let h = match self {
                    Self::Author => Handle::new(value, h.name, h.version),
                    Self::Name => Handle::new(h.author, value, h.version),
                    _ => Handle::new(h.author, h.name, value),
                };
                d.set_handle(&h);
            }
        }
    }
}

/// Source of values for Datafile fields that are still missing.
pub trait Prompt {
    /// Ask for `field`, showing `current` as the default. `None` keeps the
    /// current value.
    fn ask(&self, field: Field, current: &str) -> Result<Option<String>>;
}

/// Prompt that never answers; fields keep their current or default values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&self, _: Field, _: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Values for `pack make` given up front (flags), applied before prompting.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    pub user: String,
    /// Directory basename, used for the dataset id.
    pub dir_name: String,
    pub index_base_url: String,
}

/// Fill in missing fields: defaults first, then `prompt` for anything
/// required that is still empty. Optional fields are only asked about when
/// `interactive` is set.
pub fn fill_out(
    descriptor: &mut Descriptor,
    defaults: &Defaults,
    prompt: &dyn Prompt,
    interactive: bool,
) -> Result<()> {
    let mut h = descriptor.handle();
    if h.author.is_empty() {
        h.author = defaults.user.to_lowercase();
    }
    if h.name.is_empty() {
        h.name = ident_string(&defaults.dir_name);
    }
    if h.version.is_empty() || h.version == data_schema::LATEST {
        h.version = "1.0".to_string();
    }
    descriptor.set_handle(&Handle::new(h.author, h.name, h.version));

    for field in Field::ALL {
        let current = field.get(descriptor);
        if !current.is_empty() && !interactive {
            continue;
        }
        if !field.required() && !interactive {
            continue;
        }
        if let Some(value) = prompt.ask(field, &current)? {
            let value = value.trim().to_string();
            if !value.is_empty() {
                field.set(descriptor, value);
            }
        }
    }

    if descriptor.website.is_empty() && descriptor.handle().is_valid() {
        descriptor.website = format!(
            "{}/{}",
            defaults.index_base_url.trim_end_matches('/'),
            descriptor.dataset
        );
    }
    Ok(())
}
