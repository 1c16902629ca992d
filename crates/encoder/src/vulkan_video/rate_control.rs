//! Rate-control capability negotiation.
//!
//! Turns the device-reported encode capabilities and the requested bitrate
//! into an immutable rate-control configuration, consumed once at session
//! initialization and never renegotiated. Preference order is CBR, then VBR,
//! then the device's unmanaged default (`None`).

use ash::vk;
use tracing::{debug, warn};

use fv_common::Rational;

use crate::vulkan_video::device::EncodeCapabilities;

/// Leaky-bucket window of the virtual buffer model, in milliseconds. Fixed
/// smoothing parameters, not user-configurable.
pub const VIRTUAL_BUFFER_SIZE_MS: u32 = 5_000;
/// Initial fill of the virtual buffer, in milliseconds.
pub const INITIAL_VIRTUAL_BUFFER_SIZE_MS: u32 = 4_000;

/// Managed rate-control mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RateControlMode {
    Cbr,
    Vbr,
}

/// Negotiated rate-control configuration.
#[derive(Copy, Clone, Debug)]
pub struct RateControlConfig {
    pub mode: RateControlMode,
    /// Average bitrate in bits/sec, clamped to the device maximum.
    pub average_bitrate: u64,
    /// Peak bitrate in bits/sec. Twice the requested average under VBR
    /// (clamped); equal to the average under CBR.
    pub peak_bitrate: u64,
    pub frame_rate: Rational,
    pub virtual_buffer_size_ms: u32,
    pub initial_virtual_buffer_size_ms: u32,
}

/// Repair an inconsistent capability report.
///
/// A device advertising CBR or VBR while reporting `max_bitrate == 0` gives
/// no usable bound to clamp against; rate control is disabled instead of
/// failing session creation.
pub fn sanitize_capabilities(mut caps: EncodeCapabilities) -> EncodeCapabilities {
    let managed =
        vk::VideoEncodeRateControlModeFlagsKHR::CBR | vk::VideoEncodeRateControlModeFlagsKHR::VBR;
    if caps.rate_control_modes.intersects(managed) && caps.max_bitrate == 0 {
        warn!("Invalid encode capabilities, disabling rate control");
        caps.rate_control_modes = vk::VideoEncodeRateControlModeFlagsKHR::DEFAULT;
    }
    caps
}

/// Negotiate the rate-control configuration.
///
/// Returns `None` when the device offers neither CBR nor VBR (or after the
/// inconsistent-report downgrade): encoding then runs under the device's
/// unmanaged default mode.
pub fn negotiate(
    caps: EncodeCapabilities,
    requested_bitrate: u64,
    fps: Rational,
) -> Option<RateControlConfig> {
    let caps = sanitize_capabilities(caps);

    debug!(
        modes = ?caps.rate_control_modes,
        max_bitrate = caps.max_bitrate,
        "Supported rate control modes"
    );

    let supports_cbr = caps
        .rate_control_modes
        .contains(vk::VideoEncodeRateControlModeFlagsKHR::CBR);
    let supports_vbr = caps
        .rate_control_modes
        .contains(vk::VideoEncodeRateControlModeFlagsKHR::VBR);

    if !supports_cbr && !supports_vbr {
        warn!("No suitable rate control available, reverting to default");
        return None;
    }

    if caps.max_bitrate < requested_bitrate {
        warn!(
            requested_mbps = requested_bitrate / 1_000_000,
            max_mbps = caps.max_bitrate / 1_000_000,
            "Configured bitrate is higher than the device maximum"
        );
    }

    let average_bitrate = requested_bitrate.min(caps.max_bitrate);
    let peak_bitrate = requested_bitrate.saturating_mul(2).min(caps.max_bitrate);

    let (mode, peak_bitrate) = if supports_cbr {
        (RateControlMode::Cbr, average_bitrate)
    } else {
        (RateControlMode::Vbr, peak_bitrate)
    };

    Some(RateControlConfig {
        mode,
        average_bitrate,
        peak_bitrate,
        frame_rate: fps,
        virtual_buffer_size_ms: VIRTUAL_BUFFER_SIZE_MS,
        initial_virtual_buffer_size_ms: INITIAL_VIRTUAL_BUFFER_SIZE_MS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(
        modes: vk::VideoEncodeRateControlModeFlagsKHR,
        max_bitrate: u64,
    ) -> EncodeCapabilities {
        EncodeCapabilities {
            rate_control_modes: modes,
            max_bitrate,
        }
    }

    #[test]
    fn clamps_to_device_maximum() {
        let config = negotiate(
            caps(vk::VideoEncodeRateControlModeFlagsKHR::CBR, 10_000_000),
            20_000_000,
            Rational::FPS_90,
        )
        .unwrap();
        assert_eq!(config.average_bitrate, 10_000_000);
        assert_eq!(config.peak_bitrate, 10_000_000);
    }

    #[test]
    fn prefers_cbr_over_vbr() {
        let both = vk::VideoEncodeRateControlModeFlagsKHR::CBR
            | vk::VideoEncodeRateControlModeFlagsKHR::VBR;
        let config = negotiate(caps(both, 100_000_000), 20_000_000, Rational::FPS_90).unwrap();
        assert_eq!(config.mode, RateControlMode::Cbr);
        // CBR pins the peak to the average.
        assert_eq!(config.peak_bitrate, config.average_bitrate);
    }

    #[test]
    fn vbr_peak_is_twice_the_request() {
        let config = negotiate(
            caps(vk::VideoEncodeRateControlModeFlagsKHR::VBR, 100_000_000),
            20_000_000,
            Rational::FPS_90,
        )
        .unwrap();
        assert_eq!(config.mode, RateControlMode::Vbr);
        assert_eq!(config.average_bitrate, 20_000_000);
        assert_eq!(config.peak_bitrate, 40_000_000);
    }

    #[test]
    fn vbr_peak_clamped_by_maximum() {
        let config = negotiate(
            caps(vk::VideoEncodeRateControlModeFlagsKHR::VBR, 30_000_000),
            20_000_000,
            Rational::FPS_90,
        )
        .unwrap();
        assert_eq!(config.peak_bitrate, 30_000_000);
    }

    #[test]
    fn inconsistent_report_downgrades_to_default() {
        // CBR advertised with no usable bitrate bound: recovered locally,
        // never an error.
        let config = negotiate(
            caps(vk::VideoEncodeRateControlModeFlagsKHR::CBR, 0),
            20_000_000,
            Rational::FPS_90,
        );
        assert!(config.is_none());
    }

    #[test]
    fn no_managed_mode_means_default() {
        let config = negotiate(
            caps(vk::VideoEncodeRateControlModeFlagsKHR::DEFAULT, 100_000_000),
            20_000_000,
            Rational::FPS_90,
        );
        assert!(config.is_none());
    }

    #[test]
    fn virtual_buffer_model_is_fixed() {
        let config = negotiate(
            caps(vk::VideoEncodeRateControlModeFlagsKHR::CBR, 100_000_000),
            20_000_000,
            Rational::FPS_90,
        )
        .unwrap();
        assert_eq!(config.virtual_buffer_size_ms, 5_000);
        assert_eq!(config.initial_virtual_buffer_size_ms, 4_000);
    }
}
