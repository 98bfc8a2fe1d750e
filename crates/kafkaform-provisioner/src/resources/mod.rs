//! Per-resource operations. Each call returns gateway and validation errors
//! unchanged; the provisioner turns them into statuses.

pub mod acl;
pub mod connector;
pub mod topic;
