use super::DeviceError;
use std::collections::HashMap;

/// `<scheme>://<authority>[?param=value(&...)]`
#[derive(Debug, Clone)]
pub struct DeviceUri {
    pub scheme: String,
    pub authority: String,
    pub params: HashMap<String, String>,
}

impl DeviceUri {
    pub fn parse(s: &str) -> Result<Self, DeviceError> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| DeviceError::BadUri(s.to_string()))?;
        let (authority, query) = match rest.split_once('?') {
            Some((a, q)) => (a, Some(q)),
            None => (rest, None),
        };
        let mut params = HashMap::new();
        if let Some(query) = query {
            for pair in query.split('&') {
                if pair.is_empty() {
                    continue;
                }
                match pair.split_once('=') {
                    Some((k, v)) => {
                        params.insert(k.to_string(), v.to_string());
                    }
                    None => {
                        params.insert(pair.to_string(), String::new());
                    }
                }
            }
        }
        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            params,
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_uri_with_ext() {
        let uri = DeviceUri::parse("file:///tmp/out?ext=pwg").unwrap();
        assert_eq!(uri.scheme, "file");
        assert_eq!(uri.authority, "/tmp/out");
        assert_eq!(uri.param("ext"), Some("pwg"));
    }

    #[test]
    fn parses_socket_uri() {
        let uri = DeviceUri::parse("socket://printer.local:9100").unwrap();
        assert_eq!(uri.scheme, "socket");
        assert_eq!(uri.authority, "printer.local:9100");
    }

    #[test]
    fn rejects_uri_without_scheme_separator() {
        assert!(DeviceUri::parse("not-a-uri").is_err());
    }
}
