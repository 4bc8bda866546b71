//! Streamed uploads over libcurl (raw body or multipart form).

use curl::easy::{Easy, Form, List, ReadError};
use std::fs::File;
use std::io::Read;
use std::str;

use super::parse::parse_response_headers;
use super::{TransferRequest, TransferResponse, Transport};
use crate::config::TransportConfig;
use crate::control::AbortSignal;
use crate::job::BodyMode;
use crate::retry::TransferError;

/// libcurl-backed [`Transport`]. One easy handle per attempt.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    config: TransportConfig,
}

impl CurlTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn configure(&self, easy: &mut Easy, request: &TransferRequest) -> Result<(), TransferError> {
        let job = &request.job;
        easy.url(job.url.as_str())?;
        easy.follow_location(self.config.follow_redirects)?;
        easy.connect_timeout(self.config.connect_timeout())?;
        easy.timeout(self.config.request_timeout())?;
        if self.config.low_speed_time_secs > 0 {
            easy.low_speed_limit(self.config.low_speed_limit_bytes)?;
            easy.low_speed_time(self.config.low_speed_time())?;
        }
        if let Some(name) = &request.network.caps.interface {
            easy.interface(&format!("if!{}", name))?;
        }

        let mut list = List::new();
        for (k, v) in &job.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        // No 100-continue round trip before the body.
        list.append("Expect:")?;
        easy.http_headers(list)?;
        easy.progress(true)?;
        Ok(())
    }
}

fn form_err(e: curl::FormError) -> TransferError {
    TransferError::Transport(format!("multipart form: {}", e))
}

impl Transport for CurlTransport {
    fn send(
        &self,
        request: &TransferRequest,
        on_progress: &mut dyn FnMut(u64),
        abort: &AbortSignal,
    ) -> Result<TransferResponse, TransferError> {
        let job = &request.job;
        let mut easy = Easy::new();
        self.configure(&mut easy, request)?;

        let mut source: Option<File> = None;
        match &job.body {
            BodyMode::Raw => {
                let file = File::open(&job.path).map_err(TransferError::LocalIo)?;
                let len = file.metadata().map_err(TransferError::LocalIo)?.len();
                easy.upload(true)?;
                easy.in_filesize(len)?;
                easy.custom_request(&job.method)?;
                source = Some(file);
            }
            BodyMode::Multipart { field, parameters } => {
                // curl opens the file itself; a missing file must still surface as local I/O.
                std::fs::metadata(&job.path).map_err(TransferError::LocalIo)?;
                let mut form = Form::new();
                for (name, value) in parameters {
                    form.part(name).contents(value.as_bytes()).add().map_err(form_err)?;
                }
                form.part(field).file(&job.path).add().map_err(form_err)?;
                easy.httppost(form)?;
                if job.method != "POST" {
                    easy.custom_request(&job.method)?;
                }
            }
        }

        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        let mut read_err: Option<std::io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(|_dltotal, _dlnow, _ultotal, ulnow| {
                on_progress(ulnow.max(0.0) as u64);
                !abort.is_aborted()
            })?;
            if let Some(file) = source.as_mut() {
                transfer.read_function(|buf| {
                    if abort.is_aborted() {
                        return Err(ReadError::Abort);
                    }
                    loop {
                        match file.read(buf) {
                            Ok(n) => return Ok(n),
                            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                            Err(e) => {
                                read_err = Some(e);
                                return Err(ReadError::Abort);
                            }
                        }
                    }
                })?;
            }
            let result = transfer.perform();
            result
        };

        if let Err(e) = performed {
            if abort.is_aborted() {
                return Err(TransferError::Aborted);
            }
            if let Some(io) = read_err {
                return Err(TransferError::LocalIo(io));
            }
            return Err(TransferError::from(e));
        }

        let status = easy.response_code()?;
        tracing::debug!(job_id = %job.id, status, "upload response");
        Ok(TransferResponse {
            status,
            headers: parse_response_headers(&header_lines),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobSpec;
    use crate::network::{Capabilities, NetworkCandidate, NetworkId, TransportKind};
    use std::sync::Arc;

    fn request(path: &std::path::Path) -> TransferRequest {
        let job = JobSpec::raw("http://127.0.0.1:9/upload", path)
            .validate(0)
            .unwrap();
        TransferRequest {
            job: Arc::new(job),
            network: NetworkCandidate {
                id: NetworkId(1),
                caps: Capabilities::usable(TransportKind::Ethernet),
            },
        }
    }

    #[test]
    fn missing_source_is_local_io_before_any_request() {
        let tmp = tempfile::tempdir().unwrap();
        let req = request(&tmp.path().join("gone.bin"));
        let mut seen = Vec::new();
        let err = CurlTransport::default()
            .send(&req, &mut |n| seen.push(n), &AbortSignal::new())
            .unwrap_err();
        assert!(matches!(err, TransferError::LocalIo(_)));
        assert!(seen.is_empty());
    }
}
