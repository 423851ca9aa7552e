//! Payloads shaped the way the backend sends them

use serde_json::{json, Value};

/// Two active patrols and one inactive, each using different key names
pub fn three_locations() -> Value {
    json!([
        {
            "patrulla": "P-01",
            "lat": 14.6349,
            "lng": -90.5069,
            "estado": "activa",
            "ts": "2024-05-01T10:00:00Z",
            "accuracy": 12.5
        },
        {
            "patrulla": "P-02",
            "lat": "14.6400",
            "lon": "-90.5100",
            "estado": "Activa",
            "ts": "2024-05-01T10:05:00Z"
        },
        {
            "nombre": "P-03",
            "latitude": 14.62,
            "longitude": -90.52,
            "estado": "inactiva",
            "updated_at": "2024-05-01 09:30:00"
        }
    ])
}

pub fn me_admin() -> Value {
    json!({
        "ok": true,
        "user": {"id": 1, "email": "admin@example.com", "roles": ["admin"]}
    })
}

pub fn me_user() -> Value {
    json!({
        "ok": true,
        "user": {"id": 7, "email": "ana@example.com", "role": "usuario"}
    })
}

pub fn login_ok(token: &str) -> Value {
    json!({"ok": true, "access_token": token})
}

/// Page `page` of a listing with `total` users, `size` per page
pub fn users_page(page: u64, size: u64, total: u64) -> Value {
    let first = (page - 1) * size;
    let last = (first + size).min(total);
    let items: Vec<Value> = (first..last)
        .map(|i| {
            json!({
                "id": i + 1,
                "email": format!("user{}@example.com", i + 1),
                "nombre": format!("Usuario {}", i + 1),
                "is_active": i % 2 == 0,
                "roles": ["usuario"]
            })
        })
        .collect();
    json!({"items": items, "page": page, "size": size, "total": total})
}

pub fn patrols_page(page: u64, size: u64, total: u64) -> Value {
    let first = (page - 1) * size;
    let last = (first + size).min(total);
    let items: Vec<Value> = (first..last)
        .map(|i| {
            json!({
                "id": i + 1,
                "codigo": format!("P-{:02}", i + 1),
                "alias": format!("Unidad {}", i + 1),
                "placa": format!("O-{:03}BBC", i + 1),
                "is_activa": true
            })
        })
        .collect();
    json!({"items": items, "page": page, "size": size, "total": total})
}
