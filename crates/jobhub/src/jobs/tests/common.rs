use crate::accounts::AuthenticatedUser;
use crate::entities::Entity;
use crate::jobs::Job;
use crate::test_support::{job_draft, world, World};

pub(super) struct Company {
    pub(super) world: World,
    pub(super) owner: AuthenticatedUser,
    pub(super) entity: Entity,
}

/// A company with 20 credits and nothing posted yet.
pub(super) fn company() -> Company {
    let world = world();
    let (owner, entity) = world.funded_company("owner@acme.test", "Acme Robotics");
    Company {
        world,
        owner,
        entity,
    }
}

impl Company {
    pub(super) fn draft(&self, title: &str) -> Job {
        self.world
            .platform
            .jobs
            .create_draft(&self.owner, &self.entity.id, job_draft(title, &["rust"]))
            .expect("drafts")
    }

    pub(super) fn published(&self, title: &str) -> Job {
        self.world
            .published_job(&self.owner, &self.entity.id, job_draft(title, &["rust"]))
    }

    pub(super) fn credits(&self) -> u32 {
        self.world.credits(&self.owner, &self.entity.id)
    }
}
