// SPDX-License-Identifier: Apache-2.0

//! HTTP transport used by the source chain. Kept behind a trait so the
//! rest of the crate can be exercised in tests without a real network.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use ureq::{Agent, AgentBuilder};

use crate::error::{PluginStoreError, Result};

/// Global agent reused across requests so connection pooling and TLS setup
/// happen once per process.
fn agent() -> &'static Agent {
	static AGENT: OnceLock<Agent> = OnceLock::new();
	AGENT.get_or_init(|| {
		AgentBuilder::new()
			.timeout_connect(Duration::from_secs(10))
			.timeout_read(Duration::from_secs(30))
			.build()
	})
}

/// A fetched response: enough to decide between streaming a download and
/// surfacing a structured error. `body` is a lazy reader over the
/// connection — nothing is buffered until a caller reads from it, so
/// memory use stays bounded regardless of how large the archive is.
pub struct Response {
	pub status: u16,
	pub body: Box<dyn Read + Send>,
}

/// The transport seam the source chain downloads through. The real
/// implementation is [`UreqClient`]; tests substitute an in-memory fake.
pub trait HttpClient: Send + Sync {
	/// Issues a GET request with an optional bearer token and the crate's
	/// standard `User-Agent`. Does not treat non-2xx statuses as errors —
	/// callers inspect [`Response::status`] themselves, since a 404 on a
	/// private repo carries a different hint than one on a public mirror.
	fn get(&self, url: &str, bearer_token: Option<&str>) -> Result<Response>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UreqClient;

fn user_agent() -> String {
	format!("pulumi-cli/1 ({}; {})", std::env::consts::OS, env!("CARGO_PKG_VERSION"))
}

const MAX_ATTEMPTS: u32 = 3;

impl HttpClient for UreqClient {
	fn get(&self, url: &str, bearer_token: Option<&str>) -> Result<Response> {
		let mut last_err = None;

		for attempt in 1..=MAX_ATTEMPTS {
			let mut request = agent().get(url).set("User-Agent", &user_agent());
			if let Some(token) = bearer_token {
				request = request.set("Authorization", &format!("token {token}"));
			}

			match request.call() {
				Ok(resp) => return Ok(read_response(resp)),
				Err(ureq::Error::Status(_, resp)) => return Ok(read_response(resp)),
				Err(ureq::Error::Transport(t)) => {
					log::debug!("transient failure fetching {url} (attempt {attempt}/{MAX_ATTEMPTS}): {t}");
					last_err = Some(t);
				}
			}
		}

		Err(PluginStoreError::SourceUnavailable {
			url: url.to_owned(),
			detail: last_err.map(|e| e.to_string()).unwrap_or_else(|| "unknown transport failure".to_owned()),
		})
	}
}

/// `ureq`'s own reader is already lazy, so this just carries the status
/// code alongside it without touching the connection.
fn read_response(resp: ureq::Response) -> Response {
	let status = resp.status();
	Response { status, body: Box::new(resp.into_reader()) }
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use std::collections::HashMap;
	use std::io::Cursor;
	use std::sync::Mutex;

	/// A fixed table of URL -> canned response, for exercising source-chain
	/// logic without a real network. Bodies are stored as plain bytes and a
	/// fresh [`Cursor`] reader is handed out on each `get`, since a boxed
	/// `Read` can't be cloned.
	#[derive(Default)]
	pub struct FakeHttpClient {
		responses: Mutex<HashMap<String, (u16, Vec<u8>)>>,
		pub seen_tokens: Mutex<Vec<(String, Option<String>)>>,
	}

	impl FakeHttpClient {
		pub fn new() -> Self {
			Self::default()
		}

		pub fn with_response(self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
			self.responses.lock().unwrap().insert(url.into(), (status, body.into()));
			self
		}
	}

	impl HttpClient for FakeHttpClient {
		fn get(&self, url: &str, bearer_token: Option<&str>) -> Result<Response> {
			self.seen_tokens.lock().unwrap().push((url.to_owned(), bearer_token.map(str::to_owned)));
			match self.responses.lock().unwrap().get(url) {
				Some((status, body)) => Ok(Response { status: *status, body: Box::new(Cursor::new(body.clone())) }),
				None => Err(PluginStoreError::SourceUnavailable {
					url: url.to_owned(),
					detail: "no canned response".to_owned(),
				}),
			}
		}
	}
}
