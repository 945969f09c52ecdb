use crate::accounts::AuthenticatedUser;
use crate::entities::Entity;
use crate::jobs::Job;
use crate::test_support::{job_draft, world, World};

pub(super) struct Hiring {
    pub(super) world: World,
    pub(super) owner: AuthenticatedUser,
    pub(super) entity: Entity,
    pub(super) job: Job,
    pub(super) candidate: AuthenticatedUser,
}

/// A published Rust role and a candidate with a profile, ready to apply.
pub(super) fn hiring() -> Hiring {
    let world = world();
    let (owner, entity) = world.funded_company("owner@acme.test", "Acme");
    let job = world.published_job(&owner, &entity.id, job_draft("Rust Engineer", &["rust"]));
    let candidate = world.candidate("ada@example.com");
    world.profile(&candidate, &["rust"], 3);

    Hiring {
        world,
        owner,
        entity,
        job,
        candidate,
    }
}
