/// UI module exports
pub mod sidebar;
