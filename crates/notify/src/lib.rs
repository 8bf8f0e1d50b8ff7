pub mod dingtalk;
pub mod feishu;
pub mod format;
pub mod multi;
