// src/models/mod.rs
pub mod game;

pub use game::{
    ContinueStatus,
    CreateSessionRequest,
    CreateSessionResponse,
    IpnNotification,
    NewScoreRecord,
    Session,
    SubmitScoreRequest,
};
