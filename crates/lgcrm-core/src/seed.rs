// ABOUTME: Seed generator producing the demo dataset used when no persisted state exists.
// ABOUTME: Builds two leads, two properties, one visit, and one task with consistent cross-references.

use chrono::Duration;

use crate::ids::{Timestamp, new_id};
use crate::record::{
    Lead, LeadStage, Operation, Property, PropertyStatus, RelatedType, Task, TaskStatus, Visit,
    VisitStatus,
};
use crate::tables::Tables;

/// Organization every seeded record belongs to.
pub const DEMO_ORG_ID: &str = "org_demo";

/// Build the demo dataset relative to `now`. Relative times (last contact,
/// visit slot, task due date) are offsets from `now`; ids are fresh.
pub fn seed_tables(now: Timestamp) -> Tables {
    let org_id = Some(DEMO_ORG_ID.to_string());

    let lead_qualified = Lead {
        id: new_id(),
        created_at: now.clone(),
        org_id: org_id.clone(),
        name: "Juan Perez".to_string(),
        email: Some("juan.perez@gmail.com".to_string()),
        phone: Some("+51 965 608 934".to_string()),
        source: Some("Facebook".to_string()),
        stage: LeadStage::Calificado,
        budget_min: Some(120_000.0),
        budget_max: Some(180_000.0),
        location: Some("Iquitos - San Juan".to_string()),
        assigned_to: None,
        last_contacted_at: Some(now.offset(Duration::hours(-26))),
    };

    let lead_new = Lead {
        id: new_id(),
        created_at: now.clone(),
        org_id: org_id.clone(),
        name: "María García".to_string(),
        email: Some("maria.garcia@gmail.com".to_string()),
        phone: Some("+51 900 000 000".to_string()),
        source: Some("Referido".to_string()),
        stage: LeadStage::Nuevo,
        budget_min: Some(1_500.0),
        budget_max: Some(2_000.0),
        location: Some("Iquitos - Punchana".to_string()),
        assigned_to: None,
        last_contacted_at: None,
    };

    let house = Property {
        id: new_id(),
        created_at: now.clone(),
        org_id: org_id.clone(),
        title: "Casa moderna con piscina".to_string(),
        operation: Operation::Sale,
        price_sale: Some(180_000.0),
        price_rent: None,
        location: Some("Urbanización Miami".to_string()),
        address: Some("Iquitos, Loreto".to_string()),
        property_type: Some("Casa".to_string()),
        bedrooms: Some(3),
        bathrooms: Some(3),
        area_sqm: Some(220.0),
        status: PropertyStatus::Active,
        description: Some("Propiedad moderna con finos acabados.".to_string()),
        amenities: Some(vec![
            "Piscina".to_string(),
            "Bar".to_string(),
            "Parrilla".to_string(),
        ]),
        image_url: None,
    };

    let apartment = Property {
        id: new_id(),
        created_at: now.clone(),
        org_id: org_id.clone(),
        title: "Mini departamento amoblado".to_string(),
        operation: Operation::Rent,
        price_sale: None,
        price_rent: Some(1_600.0),
        location: Some("Cerca UNAP Odontología".to_string()),
        address: Some("Iquitos, Loreto".to_string()),
        property_type: Some("Departamento".to_string()),
        bedrooms: Some(2),
        bathrooms: Some(2),
        area_sqm: Some(65.0),
        status: PropertyStatus::Active,
        description: Some("Funcional y listo para ocupar.".to_string()),
        amenities: Some(vec!["Menajería".to_string(), "Ventilador".to_string()]),
        image_url: None,
    };

    let visit = Visit {
        id: new_id(),
        created_at: now.clone(),
        org_id: org_id.clone(),
        lead_id: lead_qualified.id.clone(),
        property_id: Some(house.id.clone()),
        scheduled_for: now.offset(Duration::hours(2)),
        status: VisitStatus::Programada,
        notes: Some("Confirmar 1h antes".to_string()),
    };

    let task = Task {
        id: new_id(),
        created_at: now.clone(),
        org_id,
        title: "Llamar a prospecto nuevo".to_string(),
        due_date: Some(now.as_datetime().date_naive()),
        status: TaskStatus::Pending,
        related_type: Some(RelatedType::Lead),
        related_id: Some(lead_new.id.clone()),
        assignee_id: None,
    };

    Tables {
        leads: vec![lead_qualified, lead_new],
        properties: vec![house, apartment],
        visits: vec![visit],
        tasks: vec![task],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::now;

    #[test]
    fn seed_has_expected_shape() {
        let seed = seed_tables(now());
        assert_eq!(seed.leads.len(), 2);
        assert_eq!(seed.properties.len(), 2);
        assert_eq!(seed.visits.len(), 1);
        assert_eq!(seed.tasks.len(), 1);

        assert_eq!(seed.leads[0].name, "Juan Perez");
        assert_eq!(seed.leads[1].stage, LeadStage::Nuevo);
        assert_eq!(seed.properties[1].operation, Operation::Rent);
    }

    #[test]
    fn seed_cross_references_are_consistent() {
        let seed = seed_tables(now());
        let visit = &seed.visits[0];
        assert_eq!(visit.lead_id, seed.leads[0].id);
        assert_eq!(visit.property_id.as_deref(), Some(seed.properties[0].id.as_str()));

        let task = &seed.tasks[0];
        assert_eq!(task.related_type, Some(RelatedType::Lead));
        assert_eq!(task.related_id.as_deref(), Some(seed.leads[1].id.as_str()));
    }

    #[test]
    fn seed_times_are_relative_to_now() {
        let at: Timestamp = "2026-06-10T12:00:00Z".parse().unwrap();
        let seed = seed_tables(at);

        assert_eq!(
            seed.leads[0].last_contacted_at.as_ref().unwrap().as_str(),
            "2026-06-09T10:00:00.000000Z"
        );
        assert_eq!(
            seed.visits[0].scheduled_for.as_str(),
            "2026-06-10T14:00:00.000000Z"
        );
        assert_eq!(seed.tasks[0].due_date.unwrap().to_string(), "2026-06-10");
    }

    #[test]
    fn seed_ids_are_unique() {
        let seed = seed_tables(now());
        let mut ids: Vec<&str> = seed.leads.iter().map(|l| l.id.as_str()).collect();
        ids.extend(seed.properties.iter().map(|p| p.id.as_str()));
        ids.extend(seed.visits.iter().map(|v| v.id.as_str()));
        ids.extend(seed.tasks.iter().map(|t| t.id.as_str()));
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
