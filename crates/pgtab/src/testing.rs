//! Scripted connection source for unit tests.
//!
//! Records every statement with its params, answers from a queue of scripted
//! replies and counts connection checkouts and releases. Like the driver
//! path, a `SELECT` whose select list is not all text fails to decode.

use crate::client::{ConnectionSource, GenericClient, TextRow};
use crate::error::{TabError, TabResult};
use crate::sql::validate_ident;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

enum Reply {
    Rows(Vec<TextRow>),
    Affected(u64),
    Fail(String),
}

#[derive(Default)]
struct State {
    replies: Mutex<VecDeque<Reply>>,
    log: Mutex<Vec<Executed>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
    closed: AtomicBool,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedSource {
    state: Arc<State>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn reply(&self, reply: Reply) -> &Self {
        self.state.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn reply_rows(&self, rows: &[&[Option<&str>]]) -> &Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.map(str::to_string)).collect())
            .collect();
        self.reply(Reply::Rows(rows))
    }

    pub fn reply_affected(&self, count: u64) -> &Self {
        self.reply(Reply::Affected(count))
    }

    pub fn reply_error(&self, message: &str) -> &Self {
        self.reply(Reply::Fail(message.to_string()))
    }

    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.log.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }
}

pub(crate) struct ScriptedConn {
    state: Arc<State>,
}

impl ScriptedConn {
    fn next(&self, sql: &str, params: &[Option<String>]) -> Option<Reply> {
        self.state.log.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.state.replies.lock().unwrap().pop_front()
    }
}

impl Drop for ScriptedConn {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Select-list items that would not come back as text.
///
/// Bare identifiers are taken as textual columns; anything else must end in
/// a `::text` cast.
pub(crate) fn non_text_projections(sql: &str) -> Vec<&str> {
    let Some(rest) = sql.strip_prefix("SELECT ") else {
        return Vec::new();
    };
    let list = rest.split(" FROM ").next().unwrap_or_default();
    list.split(", ")
        .filter(|item| !item.ends_with("::text") && validate_ident(item).is_err())
        .collect()
}

impl GenericClient for ScriptedConn {
    async fn query(&self, sql: &str, params: &[Option<String>]) -> TabResult<Vec<TextRow>> {
        let reply = self.next(sql, params);
        if let Some(item) = non_text_projections(sql).first() {
            return Err(TabError::decode(format!(
                "'{}' is not readable as text",
                item
            )));
        }
        match reply {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(TabError::query(message)),
            Some(Reply::Affected(_)) | None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, sql: &str, params: &[Option<String>]) -> TabResult<u64> {
        match self.next(sql, params) {
            Some(Reply::Affected(count)) => Ok(count),
            Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
            Some(Reply::Fail(message)) => Err(TabError::query(message)),
            None => Ok(0),
        }
    }
}

impl ConnectionSource for ScriptedSource {
    type Connection = ScriptedConn;

    fn is_available(&self) -> bool {
        !self.state.closed.load(Ordering::SeqCst)
    }

    async fn acquire(&self) -> TabResult<ScriptedConn> {
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedConn {
            state: Arc::clone(&self.state),
        })
    }
}
