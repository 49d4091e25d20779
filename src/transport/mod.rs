//! §6: the five JSON-RPC methods' wire shapes. The listener itself (the
//! HTTP/JSON-RPC transport) is an external collaborator (§1 Out of scope);
//! this module stops at the DTOs and the error envelope they share.

pub mod dto;
