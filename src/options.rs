use std::fmt;

/// Engine-wide option bits. Read from the environment once at startup and
/// then treated as frozen; the only later mutation is the one-time
/// `INITIALISED` transition during engine construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions(u32);

impl EngineOptions {
    /// Installed kernels are consulted. If clear, dispatch behaves as if no
    /// cell is ever found (full bypass).
    pub const USE: EngineOptions = EngineOptions(0x01);
    /// The installer chain has run. Internal, but representable in the same
    /// word so the whole state round-trips through one mask.
    pub const INITIALISED: EngineOptions = EngineOptions(0x02);
    /// Emit diagnostic trace lines for installs and dispatch hits.
    pub const TRACE: EngineOptions = EngineOptions(0x10);

    /// Environment variable holding the hex override for the whole word.
    pub const ENV_VAR: &'static str = "BLENDCORE_COMPOSITE";

    /// Read the override from [`Self::ENV_VAR`]; absent or unparsable input
    /// yields the compiled-in default.
    pub fn from_env() -> EngineOptions {
        match std::env::var(Self::ENV_VAR) {
            Ok(raw) => Self::from_override(&raw),
            Err(_) => EngineOptions::default(),
        }
    }

    /// Parse an ASCII hex word, `strtoul`-style: optional `0x` prefix, the
    /// longest leading run of hex digits wins, anything after it is ignored,
    /// and overlong input saturates. A string with no hex prefix at all
    /// falls back to the compiled-in default.
    ///
    /// The parsed word replaces the default rather than merging with it;
    /// merging would make the `USE` bit impossible to clear and the bypass
    /// mode unreachable.
    pub fn from_override(raw: &str) -> EngineOptions {
        match parse_hex_prefix(raw) {
            Some(bits) => EngineOptions(bits),
            None => EngineOptions::default(),
        }
    }

    pub const fn from_bits(bits: u32) -> EngineOptions {
        EngineOptions(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EngineOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: EngineOptions) {
        self.0 |= other.0;
    }

    pub const fn kernels_enabled(self) -> bool {
        self.contains(EngineOptions::USE)
    }

    pub const fn tracing_enabled(self) -> bool {
        self.contains(EngineOptions::TRACE)
    }

    pub const fn initialised(self) -> bool {
        self.contains(EngineOptions::INITIALISED)
    }
}

impl Default for EngineOptions {
    /// Compiled-in default: kernels enabled, tracing off, not initialised.
    fn default() -> EngineOptions {
        EngineOptions::USE
    }
}

impl fmt::Display for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

fn parse_hex_prefix(raw: &str) -> Option<u32> {
    let s = raw.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
    if digits.is_empty() {
        return None;
    }
    // More than eight digits cannot fit in the word; saturate like strtoul.
    Some(u32::from_str_radix(&digits, 16).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_kernels_only() {
        let opts = EngineOptions::default();
        assert!(opts.kernels_enabled());
        assert!(!opts.tracing_enabled());
        assert!(!opts.initialised());
    }

    #[test]
    fn override_replaces_the_word() {
        let opts = EngineOptions::from_override("10");
        assert!(opts.tracing_enabled());
        assert!(!opts.kernels_enabled());

        let opts = EngineOptions::from_override("11");
        assert!(opts.tracing_enabled());
        assert!(opts.kernels_enabled());
    }

    #[test]
    fn override_accepts_0x_prefix_and_trailing_garbage() {
        assert_eq!(EngineOptions::from_override("0x2").bits(), 0x2);
        assert_eq!(EngineOptions::from_override("10zz").bits(), 0x10);
        assert_eq!(EngineOptions::from_override("  1 ").bits(), 0x1);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        assert_eq!(EngineOptions::from_override("zzz"), EngineOptions::default());
        assert_eq!(EngineOptions::from_override(""), EngineOptions::default());
        assert_eq!(
            EngineOptions::from_override("0x"),
            EngineOptions::default()
        );
    }

    #[test]
    fn overlong_input_saturates() {
        assert_eq!(
            EngineOptions::from_override("fffffffff").bits(),
            u32::MAX
        );
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(EngineOptions::from_bits(0x11).to_string(), "0x11");
    }
}
