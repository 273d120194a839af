//! One-time default data seeding for absent collection slots.
//! Seeding keys off slot absence only, so a collection that exists but is
//! empty is left alone and existing data is never overwritten.

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::security;

use super::records::{Invoice, Kind, Milestone, Notification, Order, Product, Role, User};
use super::Store;

pub(crate) fn initialize(store: &Store) -> AppResult<()> {
    if store.medium().get(User::KEY)?.is_none() {
        let password_hash = security::hash_password("admin123")
            .map_err(|e| AppError::internal("seed_hash".to_string(), e.to_string()))?;
        store.add(User {
            email: "admin@example.com".into(),
            password_hash,
            role: Role::Admin,
            company_name: "Admin Company".into(),
            contact_person: "Admin User".into(),
            phone: String::new(),
            address: String::new(),
            is_active: true,
            total_spend: 0.0,
        })?;
        debug!(target: "tradepost::storage", "seed: wrote default admin user");
    }

    if store.medium().get(Product::KEY)?.is_none() {
        for product in default_products() {
            store.add(product)?;
        }
        debug!(target: "tradepost::storage", "seed: wrote default product catalog");
    }

    if store.medium().get(Milestone::KEY)?.is_none() {
        for milestone in default_milestones() {
            store.add(milestone)?;
        }
        debug!(target: "tradepost::storage", "seed: wrote default milestones");
    }

    for key in [Order::KEY, Invoice::KEY, Notification::KEY] {
        if store.medium().get(key)?.is_none() {
            store.write_rows(key, Vec::new())?;
        }
    }

    Ok(())
}

fn default_products() -> Vec<Product> {
    vec![
        Product {
            name: "Electrical Wire 2.5mm".into(),
            description: "High-quality electrical wire for residential and commercial use".into(),
            image_url: String::new(),
            price: 150.00,
            is_active: true,
        },
        Product {
            name: "PVC Pipe 1 inch".into(),
            description: "Durable PVC pipe for plumbing applications".into(),
            image_url: String::new(),
            price: 200.00,
            is_active: true,
        },
        Product {
            name: "Circuit Breaker 20A".into(),
            description: "Standard circuit breaker for electrical panels".into(),
            image_url: String::new(),
            price: 350.00,
            is_active: true,
        },
    ]
}

fn default_milestones() -> Vec<Milestone> {
    vec![
        Milestone {
            milestone_amount: 100_000.0,
            reward_description: "Premium Tool Kit".into(),
            is_active: true,
        },
        Milestone {
            milestone_amount: 500_000.0,
            reward_description: "Gift Voucher ₹10,000".into(),
            is_active: true,
        },
    ]
}
