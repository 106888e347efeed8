use serde::{Deserialize, Serialize};

/// A row under `usuarios/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(rename = "saldo")]
    pub balance: f64,
    #[serde(rename = "activo")]
    pub active: bool,
}

impl UserProfile {
    pub fn sample() -> Self {
        Self {
            name: "Pedro Prueba".to_string(),
            email: "pedro.prueba@example.com".to_string(),
            balance: 1500.75,
            active: true,
        }
    }
}

/// A row under `transacciones/<generated key>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    /// Epoch seconds.
    #[serde(rename = "fecha")]
    pub date: i64,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "usuario_id")]
    pub user_id: String,
}

impl TransactionRecord {
    pub fn grocery_purchase(user_id: &str, date: i64) -> Self {
        Self {
            description: "Compra de víveres".to_string(),
            amount: -50.25,
            date,
            category: "alimentos".to_string(),
            user_id: user_id.to_string(),
        }
    }
}

/// Partial update applied to a [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceUpdate {
    #[serde(rename = "saldo")]
    pub balance: f64,
    #[serde(rename = "ultima_actualizacion")]
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_use_stored_field_names() {
        assert_eq!(
            serde_json::to_value(UserProfile::sample()).unwrap(),
            json!({
                "name": "Pedro Prueba",
                "email": "pedro.prueba@example.com",
                "saldo": 1500.75,
                "activo": true
            })
        );

        let record = TransactionRecord::grocery_purchase("usuario_test_001", 1700000000);
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({
                "descripcion": "Compra de víveres",
                "monto": -50.25,
                "fecha": 1700000000,
                "categoria": "alimentos",
                "usuario_id": "usuario_test_001"
            })
        );
    }
}
