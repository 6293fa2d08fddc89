use heapless::String;

pub const MAX_MCC_LENGTH: usize = 3;
pub const MAX_MNC_LENGTH: usize = 3;

/// Capacity of the MCC/MNC based fallback name
pub const DEFAULT_SPN_LENGTH: usize = 7;

const _: () = assert!(DEFAULT_SPN_LENGTH >= MAX_MCC_LENGTH + MAX_MNC_LENGTH);

/// Fallback service provider name made up of the home network MCC and MNC,
/// e.g. `"24201"`. Empty while the home network is unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultSpn(String<DEFAULT_SPN_LENGTH>);

impl DefaultSpn {
    pub const fn new() -> Self {
        Self(String::new())
    }

    /// Concatenate `mcc` and `mnc`, truncated to [`DEFAULT_SPN_LENGTH`] characters.
    pub fn from_mcc_mnc(mcc: &str, mnc: &str) -> Self {
        let mut value = String::new();
        for c in mcc.chars().chain(mnc.chars()) {
            if value.push(c).is_err() {
                break;
            }
        }
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Pick the public service provider name: the first non-empty of what the
/// SIM reports, what was cached and the MCC/MNC fallback.
pub(crate) fn public_spn<'a>(
    sim_spn: Option<&'a str>,
    cached_spn: Option<&'a str>,
    default_spn: &'a DefaultSpn,
) -> Option<&'a str> {
    [sim_spn, cached_spn, Some(default_spn.as_str())]
        .into_iter()
        .flatten()
        .find(|spn| !spn.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spn_concatenates_mcc_and_mnc() {
        assert_eq!("24201", DefaultSpn::from_mcc_mnc("242", "01").as_str());
        assert_eq!("310410", DefaultSpn::from_mcc_mnc("310", "410").as_str());
        assert!(DefaultSpn::from_mcc_mnc("", "").is_empty());
    }

    #[test]
    fn default_spn_is_truncated_to_seven_characters() {
        assert_eq!("1234567", DefaultSpn::from_mcc_mnc("1234", "56789").as_str());
        assert_eq!("1234567", DefaultSpn::from_mcc_mnc("123456789", "").as_str());
    }

    #[test]
    fn public_spn_follows_precedence() {
        let known = DefaultSpn::from_mcc_mnc("001", "01");
        let unknown = DefaultSpn::new();

        for sim in [None, Some("Sim")] {
            for cached in [None, Some("Cached")] {
                for fallback in [&unknown, &known] {
                    let expected = sim
                        .or(cached)
                        .or((!fallback.is_empty()).then_some("00101"));
                    assert_eq!(expected, public_spn(sim, cached, fallback));
                }
            }
        }
    }

    #[test]
    fn empty_sources_are_skipped() {
        let default = DefaultSpn::from_mcc_mnc("001", "01");
        assert_eq!(Some("Cached"), public_spn(Some(""), Some("Cached"), &default));
        assert_eq!(Some("00101"), public_spn(Some(""), Some(""), &default));
        assert_eq!(None, public_spn(Some(""), None, &DefaultSpn::new()));
    }
}
