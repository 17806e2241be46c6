//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Scale search on a labeled still image.
pub mod calibrate;

/// Marker detection over one or more videos.
pub mod detect;

/// Detection followed by clip export.
pub mod extract;

/// Calibration file inspection and editing.
pub mod scales;

/// Scale sweep over a video.
pub mod sweep;

use crate::cli::DetectArgs;
use crate::error::CliResult;

use markscan_core::calibration::{FixedScale, InteractivePrompt, ScaleProvider, SearchProvider};
use markscan_core::config::SearchConfig;
use markscan_core::matching::{Template, load_image};

/// Where a missing scale comes from, chosen by the detect flags.
///
/// Holds the reference frame so the search provider can borrow it.
pub(crate) enum ProviderSource {
    Fixed(f64),
    Reference(markscan_core::image::RgbImage),
    Prompt,
}

impl ProviderSource {
    pub(crate) fn from_args(args: &DetectArgs) -> CliResult<Self> {
        if let Some(scale) = args.scale {
            return Ok(Self::Fixed(scale));
        }
        match &args.reference {
            Some(path) => Ok(Self::Reference(load_image(path)?)),
            None => Ok(Self::Prompt),
        }
    }

    pub(crate) fn provider<'a>(
        &'a self,
        template: &'a Template,
        threshold: f64,
    ) -> Box<dyn ScaleProvider + 'a> {
        match self {
            Self::Fixed(scale) => Box::new(FixedScale::new(Some(*scale))),
            Self::Reference(reference) => Box::new(SearchProvider::new(
                reference,
                template,
                SearchConfig {
                    threshold,
                    ..SearchConfig::default()
                },
            )),
            Self::Prompt => Box::new(InteractivePrompt::stdio()),
        }
    }
}
