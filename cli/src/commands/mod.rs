use bulk_update::plan::{JoinCollisionPolicy, PlanOptions};

pub mod explain;
pub mod run;

fn plan_options(join_last_write_wins: bool) -> PlanOptions {
    PlanOptions {
        join_collisions: if join_last_write_wins {
            JoinCollisionPolicy::LastWriteWins
        } else {
            JoinCollisionPolicy::Unresolved
        },
    }
}
