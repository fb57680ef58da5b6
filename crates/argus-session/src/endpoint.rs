//! Connect-target construction for the three input source modes.

/// The input source the operator selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    /// Local camera streamed through the backend.
    Live,
    /// Network camera the backend connects to on our behalf.
    Cctv {
        ip: String,
        port: u16,
        username: String,
        password: String,
    },
    /// A previously uploaded file, referenced by the token the upload
    /// endpoint returned.
    Upload { filename: String },
}

impl StreamSource {
    /// Endpoint path suffix, with query values percent-encoded.
    pub fn path(&self) -> String {
        match self {
            StreamSource::Live => "/stream_video".to_string(),
            StreamSource::Cctv {
                ip,
                port,
                username,
                password,
            } => format!(
                "/connect_cctv?ip={}&port={}&username={}&password={}",
                urlencoding::encode(ip),
                port,
                urlencoding::encode(username),
                urlencoding::encode(password),
            ),
            StreamSource::Upload { filename } => {
                format!("/process_uploaded_video/{}", urlencoding::encode(filename))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamSource::Live => "live",
            StreamSource::Cctv { .. } => "cctv",
            StreamSource::Upload { .. } => "upload",
        }
    }
}

/// Full connect target: base endpoint + source path + identity query.
pub fn stream_url(base: &str, source: &StreamSource, username: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = source.path();
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{base}{path}{separator}username={}",
        urlencoding::encode(username)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_url() {
        let url = stream_url("ws://localhost:8000", &StreamSource::Live, "operator");
        assert_eq!(url, "ws://localhost:8000/stream_video?username=operator");
    }

    #[test]
    fn test_trailing_slash_is_tolerated() {
        let url = stream_url("ws://localhost:8000/", &StreamSource::Live, "operator");
        assert_eq!(url, "ws://localhost:8000/stream_video?username=operator");
    }

    #[test]
    fn test_cctv_url_appends_identity_with_ampersand() {
        let source = StreamSource::Cctv {
            ip: "192.168.1.20".to_string(),
            port: 554,
            username: "admin".to_string(),
            password: "p@ss word".to_string(),
        };
        let url = stream_url("ws://host:8000", &source, "op");
        assert_eq!(
            url,
            "ws://host:8000/connect_cctv?ip=192.168.1.20&port=554&username=admin&password=p%40ss%20word&username=op"
        );
    }

    #[test]
    fn test_upload_url_encodes_filename() {
        let source = StreamSource::Upload {
            filename: "clip 1.mp4".to_string(),
        };
        let url = stream_url("ws://host:8000", &source, "op");
        assert_eq!(
            url,
            "ws://host:8000/process_uploaded_video/clip%201.mp4?username=op"
        );
    }

    #[test]
    fn test_identity_is_urlencoded() {
        let url = stream_url("ws://h", &StreamSource::Live, "user name+1");
        assert!(url.ends_with("username=user%20name%2B1"));
    }
}
