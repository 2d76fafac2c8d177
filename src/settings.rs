use crate::core::Resolution;

/// Quality tier for a single render invocation.
///
/// `Masks` and `Low` share an engine profile: mask renders only need an ID
/// signal per pixel, not lighting quality.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Preview,
    High,
    Masks,
    Low,
}

/// Engine-level parameters derived from a quality tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineParams {
    pub tile: (u32, u32),
    pub samples: u32,
    pub max_bounces: u32,
    pub resolution: Resolution,
}

/// Map a quality tier and the scene's configured resolution to engine
/// parameters. Pure and deterministic; no error paths.
pub fn params_for(tier: QualityTier, configured: Resolution) -> EngineParams {
    // 256 px tiles are the GPU-efficient default.
    match tier {
        QualityTier::Preview => {
            let resolution = if configured.width > 1000 {
                // A common multiple of the tile size, chosen for speed.
                Resolution::new(640, 384)
            } else {
                configured
            };
            EngineParams {
                tile: (64, 64),
                samples: 8,
                max_bounces: 6,
                resolution,
            }
        }
        QualityTier::High => EngineParams {
            tile: (256, 256),
            samples: 15,
            max_bounces: 12,
            resolution: configured,
        },
        QualityTier::Masks | QualityTier::Low => EngineParams {
            tile: (256, 256),
            samples: 1,
            max_bounces: 1,
            resolution: configured,
        },
    }
}
