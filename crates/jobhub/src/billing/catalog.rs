use super::domain::{Plan, PlanKind};

fn plan(code: &str, name: &str, price_cents: u64, kind: PlanKind) -> Plan {
    Plan {
        code: code.to_string(),
        name: name.to_string(),
        price_cents,
        kind,
    }
}

/// Built-in plans offered to every entity.
pub fn catalog() -> Vec<Plan> {
    vec![
        plan(
            "starter-5",
            "Starter pack (5 credits)",
            4_900,
            PlanKind::CreditPack { credits: 5 },
        ),
        plan(
            "growth-20",
            "Growth pack (20 credits)",
            17_900,
            PlanKind::CreditPack { credits: 20 },
        ),
        plan(
            "monthly-10",
            "Monthly, 10 postings",
            29_900,
            PlanKind::Subscription {
                postings: 10,
                period_days: 30,
                candidate_search: false,
            },
        ),
        plan(
            "monthly-unlimited-search",
            "Monthly, 25 postings with candidate search",
            59_900,
            PlanKind::Subscription {
                postings: 25,
                period_days: 30,
                candidate_search: true,
            },
        ),
    ]
}

pub fn find_plan(code: &str) -> Option<Plan> {
    let code = code.trim();
    catalog().into_iter().find(|plan| plan.code == code)
}
