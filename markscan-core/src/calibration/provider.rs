//! Sources of a scale factor when none is stored for a resolution.
//!
//! `CalibrationStore::resolve_or_prompt` asks a [`ScaleProvider`] for a value
//! and takes care of validation and persistence. Providers only produce a
//! candidate; returning `Ok(None)` means the operator (or the search) had
//! nothing to offer.

use super::Resolution;
use crate::config::SearchConfig;
use crate::error::CoreResult;
use crate::matching::Template;
use crate::processing::scale_search::search_scale;

use image::RgbImage;
use log::{info, warn};
use std::io::{self, BufRead, Write};

/// Something that can supply a scale factor for an uncalibrated resolution.
pub trait ScaleProvider {
    fn provide(&mut self, resolution: Resolution) -> CoreResult<Option<f64>>;
}

/// Asks an operator on a text stream. Blocks until a line is read.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl InteractivePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ScaleProvider for InteractivePrompt<R, W> {
    fn provide(&mut self, resolution: Resolution) -> CoreResult<Option<f64>> {
        write!(
            self.output,
            "No scale factor stored for {resolution}. Enter scale factor (> 0, empty to skip): "
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<f64>() {
            Ok(scale) => Ok(Some(scale)),
            Err(_) => {
                warn!("Could not parse '{trimmed}' as a scale factor");
                Ok(None)
            }
        }
    }
}

/// A value supplied up front, typically from the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedScale(Option<f64>);

impl FixedScale {
    pub fn new(scale: Option<f64>) -> Self {
        Self(scale)
    }
}

impl ScaleProvider for FixedScale {
    fn provide(&mut self, _resolution: Resolution) -> CoreResult<Option<f64>> {
        Ok(self.0)
    }
}

/// Runs an unseeded scale search against a labeled reference frame.
pub struct SearchProvider<'a> {
    reference: &'a RgbImage,
    template: &'a Template,
    config: SearchConfig,
}

impl<'a> SearchProvider<'a> {
    pub fn new(reference: &'a RgbImage, template: &'a Template, config: SearchConfig) -> Self {
        Self {
            reference,
            template,
            config,
        }
    }
}

impl ScaleProvider for SearchProvider<'_> {
    fn provide(&mut self, resolution: Resolution) -> CoreResult<Option<f64>> {
        let (width, height) = self.reference.dimensions();
        if (width, height) != (resolution.width, resolution.height) {
            warn!(
                "Reference frame is {width}x{height} but {resolution} was requested; skipping search"
            );
            return Ok(None);
        }

        let outcome = search_scale(self.reference, self.template, &self.config, None);
        match outcome.best {
            Some(best) if outcome.accepted => {
                info!("Search found scale {:.5} (score {:.5})", best.scale, best.score());
                Ok(Some(best.scale))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_parses_value() {
        let mut output = Vec::new();
        let mut prompt = InteractivePrompt::new(&b"0.42738\n"[..], &mut output);
        let value = prompt.provide(Resolution::new(1280, 720)).unwrap();
        assert_eq!(value, Some(0.42738));
        drop(prompt);
        assert!(String::from_utf8(output).unwrap().contains("1280x720"));
    }

    #[test]
    fn test_prompt_empty_or_garbage_is_none() {
        let res = Resolution::new(1280, 720);
        assert_eq!(InteractivePrompt::new(&b"\n"[..], io::sink()).provide(res).unwrap(), None);
        assert_eq!(InteractivePrompt::new(&b""[..], io::sink()).provide(res).unwrap(), None);
        assert_eq!(InteractivePrompt::new(&b"abc\n"[..], io::sink()).provide(res).unwrap(), None);
    }

    #[test]
    fn test_fixed_scale() {
        let res = Resolution::new(640, 480);
        assert_eq!(FixedScale::new(Some(0.5)).provide(res).unwrap(), Some(0.5));
        assert_eq!(FixedScale::new(None).provide(res).unwrap(), None);
    }
}
