//! Scripted in-process judge client for tests and dry runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::ChatMessage;
use crate::error::TransportError;

/// Replays a scripted sequence of replies (or failures), repeating the
/// last entry once the script is exhausted.
#[derive(Debug)]
pub struct MockClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
}

impl MockClient {
    /// Client that always returns the same text.
    pub fn returning(text: impl Into<String>) -> Self {
        MockClient::with_script(vec![Ok(text.into())])
    }

    /// Client that always fails as judge-unavailable.
    pub fn failing(reason: impl Into<String>) -> Self {
        MockClient::with_script(vec![Err(reason.into())])
    }

    pub fn with_script(entries: Vec<Result<String, String>>) -> Self {
        MockClient {
            script: Mutex::new(entries.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    pub async fn chat(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
        _temperature: f64,
    ) -> Result<String, TransportError> {
        let next = {
            let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
            match script.pop_front() {
                Some(entry) => {
                    let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
                    *last = Some(entry.clone());
                    Some(entry)
                }
                None => {
                    let last = self.last.lock().unwrap_or_else(|e| e.into_inner());
                    last.clone()
                }
            }
        };

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(TransportError::Unavailable(reason)),
            None => Err(TransportError::Unavailable("empty mock script".to_string())),
        }
    }
}
