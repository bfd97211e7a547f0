//! The set of live sessions, owned by the run-loop.
//!
//! 活动会话的集合，由运行循环拥有。
//!
//! Sessions never refer to each other. The registry is the single owner and
//! is only mutated between dispatches.

use super::{session::Session, traits::ConnHandle};
use crate::{
    config::Config,
    error::{Error, Result},
};
use std::{collections::HashMap, fmt};
use tracing::{debug, warn};

/// Identifies a session inside its [`Registry`].
///
/// 在 [`Registry`] 中标识一个会话。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(u64);

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        SessionId(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owned map of live sessions with O(1) insertion and removal.
#[derive(Debug)]
pub struct Registry<C> {
    sessions: HashMap<SessionId, Session<C>>,
    next_id: u64,
    config: Config,
}

impl<C: ConnHandle> Registry<C> {
    /// Creates an empty registry. Every session it creates shares `config`,
    /// which is validated here.
    ///
    /// 创建空注册表，并在此校验配置。
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: HashMap::new(),
            next_id: 1,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates a session over an established connection handle and links it in.
    ///
    /// 在已建立的连接句柄之上创建会话并加入注册表。
    pub fn create(&mut self, conn: C) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id, Session::new(id, conn, &self.config));
        debug!(session = %id, "Session created");
        id
    }

    /// Unlinks a session and hands its connection handle back to the caller,
    /// who releases it. Any outstanding unit is abandoned without notice.
    ///
    /// 移除会话并将其连接句柄交还调用方。
    pub fn destroy(&mut self, id: SessionId) -> Result<C> {
        let session = self.sessions.remove(&id).ok_or(Error::SessionNotFound(id))?;
        if session.sender().pending().is_some() {
            debug!(session = %id, "Destroying session with an unacknowledged unit");
        }
        debug!(session = %id, "Session destroyed");
        Ok(session.into_conn())
    }

    pub fn get(&self, id: SessionId) -> Option<&Session<C>> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session<C>> {
        self.sessions.get_mut(&id)
    }

    /// Looks a session up for dispatch, failing if it is gone.
    pub fn session_mut(&mut self, id: SessionId) -> Result<&mut Session<C>> {
        self.sessions.get_mut(&id).ok_or(Error::SessionNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    /// Runs the timer entry point on every session. A failing session does
    /// not stop the sweep; its error is returned for the host to act on.
    ///
    /// 对每个会话执行定时器入口点。
    pub fn on_timer(&mut self) -> Vec<(SessionId, Error)> {
        let mut failures = Vec::new();
        for (id, session) in self.sessions.iter_mut() {
            if let Err(e) = session.on_timer() {
                warn!(session = %id, error = %e, "Retransmission failed");
                failures.push((*id, e));
            }
        }
        failures
    }
}
