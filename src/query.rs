use percent_encoding::percent_decode;

/// Query parameters the fixture reacts to. Anything else in the query string
/// is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Crlf,
    Disappear,
    Reflect,
    Randomness,
}

impl Param {
    pub const ALL: [Param; 4] = [
        Param::Crlf,
        Param::Disappear,
        Param::Reflect,
        Param::Randomness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Crlf => "crlf",
            Param::Disappear => "disappear",
            Param::Reflect => "reflect",
            Param::Randomness => "randomness",
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|param| param.name().as_bytes() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The request context: decoded values of the recognized parameters for a
/// single exchange. Values are opaque bytes; nothing beyond form-urlencoded
/// decoding is applied and no UTF-8 validation happens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureQuery {
    values: [Option<Vec<u8>>; 4],
}

impl FixtureQuery {
    /// Decodes a raw query string (without the leading `?`).
    ///
    /// Never fails: `+` becomes a space and percent escapes become the bytes
    /// they encode, whatever those are. A key without `=` is present with an
    /// empty value, and the last occurrence of a repeated key wins.
    pub fn parse(query: impl AsRef<[u8]>) -> Self {
        let mut result = Self::default();
        let pairs = query
            .as_ref()
            .split(|byte| *byte == b'&')
            .filter(|pair| !pair.is_empty());

        for pair in pairs {
            let (key, value) = match pair.iter().position(|byte| *byte == b'=') {
                Some(at) => (&pair[..at], &pair[at + 1..]),
                None => (pair, &[][..]),
            };
            if let Some(param) = Param::from_name(&decode(key)) {
                result.values[param.index()] = Some(decode(value));
            }
        }
        result
    }

    /// Extracts and decodes the query from a request target such as
    /// `/server.php?reflect=hello#top`.
    pub fn from_target(target: &str) -> Self {
        let Some((_, query)) = target.split_once('?') else {
            return Self::default();
        };
        let query = query.split_once('#').map_or(query, |(query, _)| query);
        Self::parse(query)
    }

    pub fn get(&self, param: Param) -> Option<&[u8]> {
        self.values[param.index()].as_deref()
    }

    pub fn crlf(&self) -> Option<&[u8]> {
        self.get(Param::Crlf)
    }

    pub fn disappear(&self) -> Option<&[u8]> {
        self.get(Param::Disappear)
    }

    pub fn reflect(&self) -> Option<&[u8]> {
        self.get(Param::Reflect)
    }

    pub fn randomness(&self) -> Option<&[u8]> {
        self.get(Param::Randomness)
    }
}

fn decode(raw: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|byte| if *byte == b'+' { b' ' } else { *byte })
        .collect();
    percent_decode(&spaced).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_recognized_params() {
        let query = FixtureQuery::parse("crlf=a%0D%0Ab&reflect=hello+world&randomness");
        assert_eq!(query.crlf(), Some(&b"a\r\nb"[..]));
        assert_eq!(query.reflect(), Some(&b"hello world"[..]));
        assert_eq!(query.randomness(), Some(&b""[..]));
        assert_eq!(query.disappear(), None);
    }

    #[test]
    fn ignores_unknown_params() {
        let query = FixtureQuery::parse("foo=bar&xss=<script>");
        assert_eq!(query, FixtureQuery::default());
    }

    #[test]
    fn last_repeated_key_wins() {
        let query = FixtureQuery::parse("reflect=one&reflect=two");
        assert_eq!(query.reflect(), Some(&b"two"[..]));
    }

    #[test]
    fn quote_survives_decoding() {
        let query = FixtureQuery::parse("disappear=%22");
        assert_eq!(query.disappear(), Some(&b"\""[..]));
    }

    #[test]
    fn keeps_non_utf8_bytes() {
        let query = FixtureQuery::parse("crlf=a%FFb&reflect=%C3%28");
        assert_eq!(query.crlf(), Some(&b"a\xFFb"[..]));
        assert_eq!(query.reflect(), Some(&b"\xC3("[..]));
    }

    #[test]
    fn encoded_key_is_recognized() {
        let query = FixtureQuery::parse("%72eflect=x&=y&&");
        assert_eq!(query.reflect(), Some(&b"x"[..]));
    }

    #[test]
    fn target_without_query() {
        assert_eq!(FixtureQuery::from_target("/"), FixtureQuery::default());
        assert_eq!(
            FixtureQuery::from_target("/server.php?"),
            FixtureQuery::default()
        );
    }

    #[test]
    fn target_strips_fragment() {
        let query = FixtureQuery::from_target("/server.php?reflect=x#frag");
        assert_eq!(query.reflect(), Some(&b"x"[..]));
    }

    #[test]
    fn param_names_round_trip() {
        for param in Param::ALL {
            assert_eq!(Param::from_name(param.name().as_bytes()), Some(param));
        }
        assert_eq!(Param::from_name(b"CRLF"), None);
    }
}
