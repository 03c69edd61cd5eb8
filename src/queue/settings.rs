//! Per-job render setting overrides.
//!
//! Clients may only override the stroke and fill settings listed in
//! [`SettingKey`]. Anything else is dropped at the boundary so a typo can
//! never resolve to a phantom setting.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Resolved render settings handed to the device: setting-name to value.
pub type RenderSettings = BTreeMap<String, serde_json::Value>;

/// Settings a job is allowed to override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    // Stroke
    AutoStrokeEnabled,
    StrokePrecision,
    StrokeOvershoot,
    StrokeFills,
    StrokeInvisible,
    AutoStrokeIteration,
    AutoStrokeOcclusion,
    StrokeOcclusionFills,
    StrokeOcclusionStoke,
    StrokeOcclusionColor,
    StrokeOcclusionWater,
    AutoStrokeWidth,
    StrokeCloseFilled,
    // Fill
    AutoFillEnabled,
    FillType,
    FillAngle,
    FillSpacing,
    FillPrecision,
    FillGroupingThresh,
    FillHatch,
    FillRandomize,
    FillSpiralAlign,
    AutoFillIteration,
    AutoFillWidth,
    FillOcclusionFills,
}

impl SettingKey {
    pub const ALL: [SettingKey; 25] = [
        SettingKey::AutoStrokeEnabled,
        SettingKey::StrokePrecision,
        SettingKey::StrokeOvershoot,
        SettingKey::StrokeFills,
        SettingKey::StrokeInvisible,
        SettingKey::AutoStrokeIteration,
        SettingKey::AutoStrokeOcclusion,
        SettingKey::StrokeOcclusionFills,
        SettingKey::StrokeOcclusionStoke,
        SettingKey::StrokeOcclusionColor,
        SettingKey::StrokeOcclusionWater,
        SettingKey::AutoStrokeWidth,
        SettingKey::StrokeCloseFilled,
        SettingKey::AutoFillEnabled,
        SettingKey::FillType,
        SettingKey::FillAngle,
        SettingKey::FillSpacing,
        SettingKey::FillPrecision,
        SettingKey::FillGroupingThresh,
        SettingKey::FillHatch,
        SettingKey::FillRandomize,
        SettingKey::FillSpiralAlign,
        SettingKey::AutoFillIteration,
        SettingKey::AutoFillWidth,
        SettingKey::FillOcclusionFills,
    ];

    /// Wire name of the setting.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::AutoStrokeEnabled => "autostrokeenabled",
            SettingKey::StrokePrecision => "strokeprecision",
            SettingKey::StrokeOvershoot => "strokeovershoot",
            SettingKey::StrokeFills => "strokefills",
            SettingKey::StrokeInvisible => "strokeinvisible",
            SettingKey::AutoStrokeIteration => "autostrokeiteration",
            SettingKey::AutoStrokeOcclusion => "autostrokeocclusion",
            SettingKey::StrokeOcclusionFills => "strokeocclusionfills",
            SettingKey::StrokeOcclusionStoke => "strokeocclusionstoke",
            SettingKey::StrokeOcclusionColor => "strokeocclusioncolor",
            SettingKey::StrokeOcclusionWater => "strokeocclusionwater",
            SettingKey::AutoStrokeWidth => "autostrokewidth",
            SettingKey::StrokeCloseFilled => "strokeclosefilled",
            SettingKey::AutoFillEnabled => "autofillenabled",
            SettingKey::FillType => "filltype",
            SettingKey::FillAngle => "fillangle",
            SettingKey::FillSpacing => "fillspacing",
            SettingKey::FillPrecision => "fillprecision",
            SettingKey::FillGroupingThresh => "fillgroupingthresh",
            SettingKey::FillHatch => "fillhatch",
            SettingKey::FillRandomize => "fillrandomize",
            SettingKey::FillSpiralAlign => "fillspiralalign",
            SettingKey::AutoFillIteration => "autofilliteration",
            SettingKey::AutoFillWidth => "autofillwidth",
            SettingKey::FillOcclusionFills => "fillocclusionfills",
        }
    }
}

impl FromStr for SettingKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SettingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Allow-listed overrides carried by a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SettingsOverrides(BTreeMap<SettingKey, serde_json::Value>);

impl SettingsOverrides {
    /// Keep the allow-listed keys of a raw override object, dropping the rest.
    pub fn filter<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let mut kept = BTreeMap::new();
        for (name, value) in raw {
            match name.parse::<SettingKey>() {
                Ok(key) => {
                    kept.insert(key, value);
                }
                Err(()) => tracing::debug!(setting = %name, "Dropping non-overridable setting"),
            }
        }
        Self(kept)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: SettingKey) -> Option<&serde_json::Value> {
        self.0.get(&key)
    }

    /// Fold the overrides onto the baseline. Without overrides the baseline is
    /// returned unchanged.
    pub fn resolve(&self, baseline: &RenderSettings) -> RenderSettings {
        if self.is_empty() {
            return baseline.clone();
        }
        let mut resolved = baseline.clone();
        for (key, value) in &self.0 {
            resolved.insert(key.as_str().to_string(), value.clone());
        }
        resolved
    }
}
