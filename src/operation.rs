use std::fmt;

/// The enumerated compositing operations.
///
/// The engine attaches no meaning to an operation beyond being a registry
/// key; the math lives in whichever kernel is installed for it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum CompositeOperation {
    Normal,
    Dissolve,
    Behind,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Addition,
    Subtract,
    DarkenOnly,
    LightenOnly,
    Hue,
    Saturation,
    Color,
    Value,
    Divide,
    Dodge,
    Burn,
    HardLight,
    SoftLight,
    GrainExtract,
    GrainMerge,
    ColorErase,
    Erase,
    Replace,
    AntiErase,
    Blend,
    Shade,
    Swap,
    Scale,
    Convert,
    Xor,
}

/// Per-operation advisory triple describing how the operation treats
/// transparency. The engine threads these through to callers unchanged and
/// never branches on them.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct OperationEffects {
    pub affects_opacity: bool,
    pub increases_opacity: bool,
    pub decreases_opacity: bool,
}

impl OperationEffects {
    pub const NONE: OperationEffects = OperationEffects::new(false, false, false);

    const fn new(affects: bool, increases: bool, decreases: bool) -> Self {
        Self {
            affects_opacity: affects,
            increases_opacity: increases,
            decreases_opacity: decreases,
        }
    }
}

impl CompositeOperation {
    pub const ALL: [CompositeOperation; 32] = [
        CompositeOperation::Normal,
        CompositeOperation::Dissolve,
        CompositeOperation::Behind,
        CompositeOperation::Multiply,
        CompositeOperation::Screen,
        CompositeOperation::Overlay,
        CompositeOperation::Difference,
        CompositeOperation::Addition,
        CompositeOperation::Subtract,
        CompositeOperation::DarkenOnly,
        CompositeOperation::LightenOnly,
        CompositeOperation::Hue,
        CompositeOperation::Saturation,
        CompositeOperation::Color,
        CompositeOperation::Value,
        CompositeOperation::Divide,
        CompositeOperation::Dodge,
        CompositeOperation::Burn,
        CompositeOperation::HardLight,
        CompositeOperation::SoftLight,
        CompositeOperation::GrainExtract,
        CompositeOperation::GrainMerge,
        CompositeOperation::ColorErase,
        CompositeOperation::Erase,
        CompositeOperation::Replace,
        CompositeOperation::AntiErase,
        CompositeOperation::Blend,
        CompositeOperation::Shade,
        CompositeOperation::Swap,
        CompositeOperation::Scale,
        CompositeOperation::Convert,
        CompositeOperation::Xor,
    ];

    /// Advisory effect triple. All-false unless explicitly overridden for
    /// the alpha-writing operations.
    pub const fn effects(self) -> OperationEffects {
        match self {
            CompositeOperation::Normal
            | CompositeOperation::Dissolve
            | CompositeOperation::Replace
            | CompositeOperation::Convert => OperationEffects::new(true, true, true),
            CompositeOperation::Behind | CompositeOperation::AntiErase => {
                OperationEffects::new(true, true, false)
            }
            CompositeOperation::Erase
            | CompositeOperation::ColorErase
            | CompositeOperation::Xor => OperationEffects::new(true, false, true),
            _ => OperationEffects::NONE,
        }
    }

    /// Diagnostic label. Never used for logic.
    pub const fn name(self) -> &'static str {
        match self {
            CompositeOperation::Normal => "normal",
            CompositeOperation::Dissolve => "dissolve",
            CompositeOperation::Behind => "behind",
            CompositeOperation::Multiply => "multiply",
            CompositeOperation::Screen => "screen",
            CompositeOperation::Overlay => "overlay",
            CompositeOperation::Difference => "difference",
            CompositeOperation::Addition => "addition",
            CompositeOperation::Subtract => "subtract",
            CompositeOperation::DarkenOnly => "darken-only",
            CompositeOperation::LightenOnly => "lighten-only",
            CompositeOperation::Hue => "hue",
            CompositeOperation::Saturation => "saturation",
            CompositeOperation::Color => "color",
            CompositeOperation::Value => "value",
            CompositeOperation::Divide => "divide",
            CompositeOperation::Dodge => "dodge",
            CompositeOperation::Burn => "burn",
            CompositeOperation::HardLight => "hard-light",
            CompositeOperation::SoftLight => "soft-light",
            CompositeOperation::GrainExtract => "grain-extract",
            CompositeOperation::GrainMerge => "grain-merge",
            CompositeOperation::ColorErase => "color-erase",
            CompositeOperation::Erase => "erase",
            CompositeOperation::Replace => "replace",
            CompositeOperation::AntiErase => "anti-erase",
            CompositeOperation::Blend => "blend",
            CompositeOperation::Shade => "shade",
            CompositeOperation::Swap => "swap",
            CompositeOperation::Scale => "scale",
            CompositeOperation::Convert => "convert",
            CompositeOperation::Xor => "xor",
        }
    }
}

impl fmt::Display for CompositeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn all_lists_each_operation_once() {
        let set: BTreeSet<_> = CompositeOperation::ALL.into_iter().collect();
        assert_eq!(set.len(), CompositeOperation::ALL.len());
    }

    #[test]
    fn names_are_unique() {
        let set: BTreeSet<_> = CompositeOperation::ALL.iter().map(|op| op.name()).collect();
        assert_eq!(set.len(), CompositeOperation::ALL.len());
    }

    #[test]
    fn effects_default_to_all_false() {
        assert_eq!(
            CompositeOperation::Multiply.effects(),
            OperationEffects::NONE
        );
        assert_eq!(CompositeOperation::Screen.effects(), OperationEffects::NONE);
    }

    #[test]
    fn alpha_writing_operations_carry_overrides() {
        assert!(CompositeOperation::Normal.effects().affects_opacity);
        assert!(CompositeOperation::Behind.effects().increases_opacity);
        assert!(!CompositeOperation::Behind.effects().decreases_opacity);
        assert!(CompositeOperation::Erase.effects().decreases_opacity);
        assert!(!CompositeOperation::Erase.effects().increases_opacity);
    }

    #[test]
    fn operation_serializes_by_variant_name() {
        let s = serde_json::to_string(&CompositeOperation::GrainMerge).unwrap();
        assert_eq!(s, "\"GrainMerge\"");
        let back: CompositeOperation = serde_json::from_str(&s).unwrap();
        assert_eq!(back, CompositeOperation::GrainMerge);
    }
}
