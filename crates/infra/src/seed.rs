//! Demo catalog loaded at startup when seeding is enabled.

use serde_json::Value as JsonValue;

use unitdesk_catalog::{NewPerformer, NewService, PerformerStatus, split_skills};
use unitdesk_core::DomainResult;
use unitdesk_events::{EventBus, EventEnvelope};

use crate::store::UnitStore;

struct DemoService {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    price: u64,
    duration: &'static str,
}

struct DemoPerformer {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    skills: &'static str,
    rating: f64,
    status: PerformerStatus,
    hourly_rate: u64,
}

const SERVICES: [DemoService; 3] = [
    DemoService {
        id: "s1",
        name: "Ремонт компьютеров",
        category: "IT",
        price: 1500,
        duration: "2 часа",
    },
    DemoService {
        id: "s2",
        name: "Уборка офиса",
        category: "Клининг",
        price: 3000,
        duration: "3 часа",
    },
    DemoService {
        id: "s3",
        name: "Консультация юриста",
        category: "Юридические",
        price: 2000,
        duration: "1 час",
    },
];

const PERFORMERS: [DemoPerformer; 3] = [
    DemoPerformer {
        id: "p1",
        name: "Иван Петров",
        email: "ivan@mail.com",
        phone: "+79161234567",
        skills: "IT,Ремонт,Настройка",
        rating: 4.8,
        status: PerformerStatus::Available,
        hourly_rate: 750,
    },
    DemoPerformer {
        id: "p2",
        name: "Мария Сидорова",
        email: "maria@mail.com",
        phone: "+79161234568",
        skills: "Клининг,Уборка",
        rating: 4.9,
        status: PerformerStatus::Available,
        hourly_rate: 1000,
    },
    DemoPerformer {
        id: "p3",
        name: "Алексей Юристов",
        email: "alex@mail.com",
        phone: "+79161234569",
        skills: "Юридические,Консультации",
        rating: 4.7,
        status: PerformerStatus::Busy,
        hourly_rate: 2000,
    },
];

/// Load the three demo services and performers (`s1..s3`, `p1..p3`; `p3` busy).
pub fn seed_demo<B>(store: &UnitStore<B>) -> DomainResult<()>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    for s in &SERVICES {
        let input = NewService::try_new(
            Some(s.name.to_string()),
            Some(s.category.to_string()),
            Some(s.price.to_string()),
            Some(s.duration.to_string()),
            None,
        )?;
        store.add_service_with_id(s.id.into(), input)?;
    }

    for p in &PERFORMERS {
        let input = NewPerformer::try_new(
            Some(p.name.to_string()),
            Some(p.email.to_string()),
            Some(p.phone.to_string()),
            split_skills(p.skills),
            Some(p.rating),
            Some(p.hourly_rate.to_string()),
            None,
        )?;
        store.add_performer_with_id(p.id.into(), input, p.status)?;
    }

    tracing::info!(
        services = SERVICES.len(),
        performers = PERFORMERS.len(),
        "demo data seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use unitdesk_events::InMemoryEventBus;

    use crate::store::AvailabilityPolicy;

    #[test]
    fn seeds_three_of_each_with_p3_busy() {
        let store = UnitStore::new(
            Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new()),
            AvailabilityPolicy::AutoFlip,
        );
        seed_demo(&store).unwrap();

        let m = store.metrics();
        assert_eq!(m.services_count, 3);
        assert_eq!(m.performers_count, 3);
        assert_eq!(m.available_count, 2);
        assert_eq!(
            store.get_performer(&"p3".into()).unwrap().status(),
            PerformerStatus::Busy
        );
        assert_eq!(store.get_service(&"s2".into()).unwrap().price(), 3000);
    }

    #[test]
    fn seeding_twice_conflicts() {
        let store = UnitStore::new(
            Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new()),
            AvailabilityPolicy::AutoFlip,
        );
        seed_demo(&store).unwrap();
        assert!(seed_demo(&store).is_err());
    }
}
