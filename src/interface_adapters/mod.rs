// Interface adapters: wire protocol, network handling and collaborator clients.

pub mod clients;
pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod utils;
