//! Record store integration tests: CRUD contract, seeding and persistence.
//! These exercise the typed surface end to end over both the in-memory and
//! directory-backed mediums.

use std::collections::HashSet;

use anyhow::Result;
use serde_json::json;
use tempfile::tempdir;

use tradepost::storage::{
    Invoice, InvoiceStatus, JsonMap, Milestone, Order, OrderStatus, Product, Record, Role, Store,
    User,
};

fn patch(v: serde_json::Value) -> JsonMap {
    v.as_object().cloned().expect("patch literal must be an object")
}

fn wire() -> Product {
    Product { name: "Wire".into(), price: 150.0, is_active: true, ..Default::default() }
}

#[test]
fn sequential_adds_get_pairwise_distinct_ids() -> Result<()> {
    let store = Store::open_in_memory()?;
    let mut ids = HashSet::new();
    for i in 0..50 {
        let rec = store.add(Product { name: format!("p{}", i), ..Default::default() })?;
        assert!(ids.insert(rec.id), "duplicate id minted");
    }
    Ok(())
}

#[test]
fn add_then_get_round_trips() -> Result<()> {
    let store = Store::open_in_memory()?;
    let added = store.add(wire())?;
    assert!(!added.id.is_empty());
    assert!(added.updated_at >= added.created_at);

    let fetched = store.get::<Product>(&added.id)?.expect("just-added record");
    assert_eq!(fetched, added);
    assert_eq!(fetched.fields, wire());
    Ok(())
}

#[test]
fn partial_update_preserves_unspecified_fields() -> Result<()> {
    let store = Store::open_in_memory()?;
    let added = store.add(wire())?;

    let updated = store
        .update::<Product>(&added.id, patch(json!({"price": 175.0})))?
        .expect("record exists");
    assert_eq!(updated.fields.price, 175.0);
    assert_eq!(updated.fields.name, "Wire");
    assert!(updated.fields.is_active);
    assert_eq!(updated.created_at, added.created_at);
    assert!(updated.updated_at >= added.updated_at);

    // exactly one record with that id in the listing
    let listed = store.list::<Product>()?;
    assert_eq!(listed.iter().filter(|p| p.id == added.id).count(), 1);
    Ok(())
}

#[test]
fn update_of_missing_id_is_none_and_changes_nothing() -> Result<()> {
    let store = Store::open_in_memory()?;
    let before = store.list::<Product>()?;
    let out = store.update::<Product>("no-such-id", patch(json!({"price": 1.0})))?;
    assert!(out.is_none());
    assert_eq!(store.list::<Product>()?, before);
    Ok(())
}

#[test]
fn delete_is_idempotent() -> Result<()> {
    let store = Store::open_in_memory()?;
    let added = store.add(wire())?;

    assert!(store.delete::<Product>(&added.id)?);
    assert!(store.get::<Product>(&added.id)?.is_none());
    // second delete completes without fault and reports nothing removed
    assert!(!store.delete::<Product>(&added.id)?);
    Ok(())
}

#[test]
fn query_filters_orders_by_partner_in_insertion_order() -> Result<()> {
    let store = Store::open_in_memory()?;
    let mut expected = Vec::new();
    for i in 0..6 {
        let partner = if i % 2 == 0 { "p-even" } else { "p-odd" };
        let rec = store.add(Order {
            partner_id: partner.into(),
            total_amount: i as f64,
            status: OrderStatus::Pending,
            ..Default::default()
        })?;
        if i % 2 == 0 {
            expected.push(rec.id);
        }
    }
    let got: Vec<String> =
        store.orders_by_partner("p-even")?.into_iter().map(|o| o.id).collect();
    assert_eq!(got, expected);
    Ok(())
}

#[test]
fn caller_supplied_identity_is_honored_at_creation() -> Result<()> {
    use chrono::{DateTime, Utc};
    let store = Store::open_in_memory()?;
    let created: DateTime<Utc> =
        DateTime::parse_from_rfc3339("2020-06-01T12:00:00Z")?.with_timezone(&Utc);
    let restored = store.add_record(Record {
        id: "imported-1".into(),
        created_at: created,
        updated_at: created,
        fields: wire(),
    })?;
    assert_eq!(restored.id, "imported-1");
    assert_eq!(restored.created_at, created);
    assert!(restored.updated_at >= created);
    assert!(store.get::<Product>("imported-1")?.is_some());
    Ok(())
}

#[test]
fn patch_cannot_clobber_identity_or_creation_time() -> Result<()> {
    let store = Store::open_in_memory()?;
    let added = store.add(wire())?;
    let updated = store
        .update::<Product>(
            &added.id,
            patch(json!({"_id": "hijacked", "createdAt": "1999-01-01T00:00:00Z", "price": 9.0})),
        )?
        .expect("record exists");
    assert_eq!(updated.id, added.id);
    assert_eq!(updated.created_at, added.created_at);
    assert_eq!(updated.fields.price, 9.0);
    assert!(store.get::<Product>("hijacked")?.is_none());
    Ok(())
}

#[test]
fn seeding_writes_defaults_into_absent_slots() -> Result<()> {
    let store = Store::open_in_memory()?;

    let users = store.list::<User>()?;
    assert_eq!(users.len(), 1);
    let admin = &users[0];
    assert_eq!(admin.fields.email, "admin@example.com");
    assert_eq!(admin.fields.role, Role::Admin);
    assert!(admin.fields.is_active);
    // seeded credential is hashed, never cleartext
    assert!(admin.fields.password_hash.starts_with("$argon2"));

    let products = store.list::<Product>()?;
    assert_eq!(products.len(), 3);
    assert!(products.iter().any(|p| p.fields.name == "Electrical Wire 2.5mm"));

    assert_eq!(store.list::<Milestone>()?.len(), 2);
    assert!(store.list::<Order>()?.is_empty());
    Ok(())
}

#[test]
fn seeding_is_idempotent_across_reopen() -> Result<()> {
    let tmp = tempdir()?;

    let first = Store::open_dir(tmp.path())?;
    let seeded_ids: Vec<String> = first.list::<Product>()?.into_iter().map(|p| p.id).collect();
    let extra = first.add(wire())?;
    drop(first);

    let second = Store::open_dir(tmp.path())?;
    let products = second.list::<Product>()?;
    assert_eq!(products.len(), seeded_ids.len() + 1);
    let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
    for id in &seeded_ids {
        assert!(ids.contains(id), "seeded id was rewritten on reopen");
    }
    assert!(ids.contains(&extra.id));
    Ok(())
}

#[test]
fn records_persist_across_store_handles() -> Result<()> {
    let tmp = tempdir()?;

    let writer = Store::open_dir(tmp.path())?;
    let added = writer.add(wire())?;
    writer.close();

    let reader = Store::open_dir(tmp.path())?;
    let fetched = reader.get::<Product>(&added.id)?.expect("persisted record");
    assert_eq!(fetched, added);
    Ok(())
}

#[test]
fn invoice_lookups_follow_their_foreign_keys() -> Result<()> {
    let store = Store::open_in_memory()?;
    let order = store.add(Order { partner_id: "partner-1".into(), ..Default::default() })?;
    let other = store.add(Order { partner_id: "partner-2".into(), ..Default::default() })?;
    let inv_a = store.add(Invoice {
        order_id: order.id.clone(),
        partner_id: "partner-1".into(),
        amount: 1200.0,
        status: InvoiceStatus::Unpaid,
    })?;
    let inv_b = store.add(Invoice {
        order_id: other.id.clone(),
        partner_id: "partner-2".into(),
        amount: 90.0,
        status: InvoiceStatus::Paid,
    })?;

    assert_eq!(store.invoice_by_order(&order.id)?.map(|i| i.id), Some(inv_a.id.clone()));
    assert_eq!(store.invoice_by_order("no-such-order")?, None);

    let mine = store.invoices_by_partner("partner-2")?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, inv_b.id);
    Ok(())
}

#[test]
fn dangling_foreign_keys_are_not_rejected() -> Result<()> {
    let store = Store::open_in_memory()?;
    let order = store.add(Order { partner_id: "no-such-user".into(), ..Default::default() })?;
    assert_eq!(store.orders_by_partner("no-such-user")?.len(), 1);
    assert!(store.get::<User>(&order.fields.partner_id)?.is_none());
    Ok(())
}
