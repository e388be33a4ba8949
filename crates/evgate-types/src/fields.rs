//! Well-known JSON field names shared by commands, documents and audit
//! records. Aggregate documents use underscore-prefixed technical fields
//! so they never collide with domain fields.

pub const ACL: &str = "_acl";
pub const ACL_GET: &str = "get";
pub const COMMAND: &str = "_command";
pub const CORR: &str = "_corr";
pub const DELETED: &str = "_deleted";
pub const ID: &str = "_id";
pub const JWT: &str = "_jwt";
pub const OPS: &str = "_ops";
pub const TIMESTAMP: &str = "_timestamp";
pub const TYPE: &str = "_type";

pub const JWT_BREAKING_THE_GLASS: &str = "breakingTheGlass";
pub const JWT_ROLES: &str = "roles";
pub const JWT_SUB: &str = "sub";

pub mod audit {
    pub const AGGREGATE: &str = "aggregate";
    pub const BREAKING_THE_GLASS: &str = "breakingTheGlass";
    pub const COMMAND: &str = "command";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TYPE: &str = "type";
    pub const USER: &str = "user";
}

pub mod commands {
    pub const DELETE: &str = "delete";
    pub const PATCH: &str = "patch";
    pub const PUT: &str = "put";
}
