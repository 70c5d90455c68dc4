/*
 * Responsibility
 * - リソースごとの「意味付き ID 型」を宣言する
 *
 * pub で列挙するものは ./mod.rs 経由で全て公開される
 */
use super::core::ResourceId;

pub enum ProjectTag {}
pub type ProjectId = ResourceId<ProjectTag>;

pub enum TaskTag {}
pub type TaskId = ResourceId<TaskTag>;
