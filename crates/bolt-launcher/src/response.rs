use std::io;

pub const MIME_TEXT_PLAIN: &str = "text/plain";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub status: u16,
    pub mime_type: &'static str,
    pub content_length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// More reads may follow.
    Continue,
    /// The body is exhausted; `bytes_read` is always zero.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResult {
    pub bytes_read: usize,
    pub status: ReadStatus,
}

/// An in-memory response body served through the embedding layer's pull
/// protocol: `open`, `headers`, then `read`/`skip` until a read reports
/// [`ReadStatus::Stop`], or `cancel` at any point.
///
/// The cursor only moves forward and never passes `len`. The buffer is
/// released as soon as the stream is exhausted or cancelled.
#[derive(Debug)]
pub struct SyntheticResponse {
    status: u16,
    mime_type: &'static str,
    body: Vec<u8>,
    len: usize,
    cursor: usize,
}

impl SyntheticResponse {
    pub fn new(status: u16, mime_type: &'static str, body: Vec<u8>) -> Self {
        let len = body.len();
        Self {
            status,
            mime_type,
            body,
            len,
            cursor: 0,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, MIME_TEXT_PLAIN, body.into().into_bytes())
    }

    pub fn ok() -> Self {
        Self::text(STATUS_OK, "OK\n")
    }

    pub fn bad_request() -> Self {
        Self::text(STATUS_BAD_REQUEST, "Bad Request")
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Remaining unread body bytes.
    pub fn remaining(&self) -> &[u8] {
        if self.cursor == self.len {
            return &[];
        }
        &self.body[self.cursor..]
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == self.len
    }

    /// Always accepts the request.
    pub fn open(&mut self) -> bool {
        true
    }

    pub fn headers(&self) -> ResponseHeaders {
        ResponseHeaders {
            status: self.status,
            mime_type: self.mime_type,
            content_length: self.len as u64,
        }
    }

    pub fn read(&mut self, out: &mut [u8]) -> ReadResult {
        if self.cursor == self.len {
            self.release();
            return ReadResult {
                bytes_read: 0,
                status: ReadStatus::Stop,
            };
        }
        let n = out.len().min(self.len - self.cursor);
        out[..n].copy_from_slice(&self.body[self.cursor..self.cursor + n]);
        self.cursor += n;
        ReadResult {
            bytes_read: n,
            status: ReadStatus::Continue,
        }
    }

    pub fn skip(&mut self, n: u64) -> u64 {
        let remaining = (self.len - self.cursor) as u64;
        let skipped = n.min(remaining);
        // skipped <= remaining, which came from a usize
        self.cursor += skipped as usize;
        skipped
    }

    /// Forces EOF. Idempotent.
    pub fn cancel(&mut self) {
        self.cursor = self.len;
        self.release();
    }

    fn release(&mut self) {
        if !self.body.is_empty() {
            self.body = Vec::new();
        }
    }
}

impl io::Read for SyntheticResponse {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ok(SyntheticResponse::read(self, buf).bytes_read)
    }
}
