use std::str::FromStr;
use thiserror::Error;
use crate::consts::{GRADIENT_FRAGMENT_SOURCE, PLASMA_FRAGMENT_SOURCE};

pub const SHADER_ENV: &str = "FRAGMENT_SHADER";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShaderVariant {
    /// Radial distance from the screen center, tinted by the slider color.
    Gradient,
    /// Time-animated plasma.
    #[default]
    Plasma,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown shader variant '{0}', expected 'gradient' or 'plasma'")]
pub struct UnknownVariant(String);

impl ShaderVariant {
    pub fn fragment_source(self) -> &'static str {
        match self {
            Self::Gradient => GRADIENT_FRAGMENT_SOURCE,
            Self::Plasma => PLASMA_FRAGMENT_SOURCE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gradient => "gradient",
            Self::Plasma => "plasma",
        }
    }

    /// Reads the variant from `FRAGMENT_SHADER`, falling back to the default
    /// on absent or unknown values.
    pub fn from_env() -> Self {
        Self::resolve(std::env::var(SHADER_ENV).ok().as_deref())
    }

    fn resolve(value: Option<&str>) -> Self {
        match value.map(str::parse::<Self>) {
            None => Self::default(),
            Some(Ok(variant)) => variant,
            Some(Err(e)) => {
                tracing::warn!("{e}; using '{}'", Self::default().name());
                Self::default()
            }
        }
    }
}

impl FromStr for ShaderVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient" => Ok(Self::Gradient),
            "plasma" => Ok(Self::Plasma),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_variants_case_insensitively() {
        assert_eq!("gradient".parse(), Ok(ShaderVariant::Gradient));
        assert_eq!(" Plasma ".parse(), Ok(ShaderVariant::Plasma));
    }

    #[test]
    fn rejects_unknown_variant() {
        assert_eq!(
            "mandelbrot".parse::<ShaderVariant>(),
            Err(UnknownVariant("mandelbrot".into()))
        );
    }

    #[test]
    fn resolve_falls_back_to_plasma() {
        assert_eq!(ShaderVariant::resolve(None), ShaderVariant::Plasma);
        assert_eq!(ShaderVariant::resolve(Some("nope")), ShaderVariant::Plasma);
        assert_eq!(ShaderVariant::resolve(Some("gradient")), ShaderVariant::Gradient);
    }

    #[test]
    fn variant_selects_matching_source() {
        assert_eq!(ShaderVariant::Gradient.fragment_source(), GRADIENT_FRAGMENT_SOURCE);
        assert_eq!(ShaderVariant::Plasma.fragment_source(), PLASMA_FRAGMENT_SOURCE);
    }
}
