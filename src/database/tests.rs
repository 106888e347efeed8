use super::*;
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    name: String,
    saldo: f64,
}

fn mock_database(server: &MockServer) -> FirebaseDatabase {
    let client = ClientBuilder::new(Client::new()).build();
    FirebaseDatabase::new_with_client(client, server.url(""))
}

#[test]
fn test_reference_paths() {
    let db = FirebaseDatabase::new_with_client(
        ClientBuilder::new(Client::new()).build(),
        "https://demo-project-default-rtdb.firebaseio.com/".to_string(),
    );

    let root = db.root();
    assert_eq!(root.key(), None);
    assert_eq!(
        root.url().unwrap().as_str(),
        "https://demo-project-default-rtdb.firebaseio.com/.json"
    );

    let field = db.child("usuarios").child("usuario_test_001/activo");
    assert_eq!(field.key(), Some("activo"));
    assert_eq!(field.path(), "usuarios/usuario_test_001/activo");
    assert_eq!(
        field.url().unwrap().as_str(),
        "https://demo-project-default-rtdb.firebaseio.com/usuarios/usuario_test_001/activo.json"
    );

    assert_eq!(db.reference("/a//b/").path(), "a/b");
}

#[test]
fn test_reference_keeps_namespace_query() {
    let db = FirebaseDatabase::new_with_client(
        ClientBuilder::new(Client::new()).build(),
        "http://127.0.0.1:9000/?ns=demo-project".to_string(),
    );

    let url = db.child("transacciones").limit_to_last(2).url().unwrap();
    assert_eq!(
        url.as_str(),
        "http://127.0.0.1:9000/transacciones.json?ns=demo-project&limitToLast=2"
    );
}

#[tokio::test]
async fn test_set_then_get() {
    let server = MockServer::start();
    let db = mock_database(&server);
    let user = User {
        name: "Pedro Prueba".to_string(),
        saldo: 1500.75,
    };

    let set_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/usuarios/usuario_test_001.json")
            .header("content-type", "application/json")
            .json_body(json!({ "name": "Pedro Prueba", "saldo": 1500.75 }));
        then.status(200)
            .json_body(json!({ "name": "Pedro Prueba", "saldo": 1500.75 }));
    });
    let get_mock = server.mock(|when, then| {
        when.method(GET).path("/usuarios/usuario_test_001.json");
        then.status(200)
            .json_body(json!({ "name": "Pedro Prueba", "saldo": 1500.75 }));
    });

    let reference = db.child("usuarios").child("usuario_test_001");
    reference.set(&user).await.unwrap();
    let snapshot = reference.get().await.unwrap();

    assert_eq!(snapshot.key(), Some("usuario_test_001"));
    assert_eq!(snapshot.deserialize::<User>().unwrap(), Some(user));
    set_mock.assert();
    get_mock.assert();
}

#[tokio::test]
async fn test_get_missing_node_is_null() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(GET).path("/usuarios/nobody.json");
        then.status(200).body("null");
    });

    let snapshot = db.child("usuarios/nobody").get().await.unwrap();
    assert!(!snapshot.exists());
    assert!(snapshot.val().is_null());
    mock.assert();
}

#[tokio::test]
async fn test_push_returns_generated_key() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/transacciones.json")
            .json_body(json!({ "descripcion": "Compra de víveres", "monto": -50.25 }));
        then.status(200).json_body(json!({ "name": "-NxYz123" }));
    });

    let key = db
        .child("transacciones")
        .push(&json!({ "descripcion": "Compra de víveres", "monto": -50.25 }))
        .await
        .unwrap();
    assert_eq!(key, "-NxYz123");
    mock.assert();
}

#[tokio::test]
async fn test_update_sends_patch() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/usuarios/usuario_test_001.json")
            .json_body(json!({ "saldo": 1450.5 }));
        then.status(200).json_body(json!({ "saldo": 1450.5 }));
    });

    db.child("usuarios/usuario_test_001")
        .update(&json!({ "saldo": 1450.5 }))
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn test_update_rejects_non_object() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(PATCH);
        then.status(200);
    });

    let result = db.child("usuarios/usuario_test_001").update(&42).await;
    assert!(matches!(result, Err(DatabaseError::SerializationError(_))));
    mock.assert_hits(0);
}

#[tokio::test]
async fn test_remove() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/transacciones/-NxYz123.json");
        then.status(200).body("null");
    });

    db.child("transacciones").child("-NxYz123").remove().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn test_query_parameters() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/transacciones.json")
            .query_param("orderBy", "\"$key\"")
            .query_param("limitToFirst", "5");
        then.status(200)
            .json_body(json!({ "-Na": { "monto": 1.0 } }));
    });

    let snapshot = db
        .child("transacciones")
        .order_by_key()
        .limit_to_first(5)
        .get()
        .await
        .unwrap();
    assert_eq!(snapshot.each().len(), 1);
    mock.assert();
}

#[tokio::test]
async fn test_shallow_and_order_by_child() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let shallow = server.mock(|when, then| {
        when.method(GET)
            .path("/usuarios.json")
            .query_param("shallow", "true");
        then.status(200)
            .json_body(json!({ "usuario_test_001": true }));
    });
    let ordered = server.mock(|when, then| {
        when.method(GET)
            .path("/transacciones.json")
            .query_param("orderBy", "\"fecha\"")
            .query_param("limitToLast", "1");
        then.status(200).json_body(json!({}));
    });

    let keys = db.child("usuarios").shallow().get().await.unwrap();
    assert_eq!(keys.each()[0].key(), Some("usuario_test_001"));

    db.child("transacciones")
        .order_by_child("fecha")
        .limit_to_last(1)
        .get()
        .await
        .unwrap();

    shallow.assert();
    ordered.assert();
}

#[tokio::test]
async fn test_database_error_parsing() {
    let server = MockServer::start();
    let db = mock_database(&server);

    let mock = server.mock(|when, then| {
        when.method(GET).path("/usuarios.json");
        then.status(401)
            .json_body(json!({ "error": "Permission denied" }));
    });

    let result = db.child("usuarios").get().await;
    if let Err(DatabaseError::ApiError(msg)) = result {
        assert_eq!(msg, "Permission denied (401 Unauthorized)");
    } else {
        panic!("Expected ApiError");
    }
    mock.assert();
}
