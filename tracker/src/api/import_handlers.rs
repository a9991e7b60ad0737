use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Json},
};

use crate::import::{self, EmployeeRows, ImportError, OrderRows, RowImporter, Sheet};
use crate::template::{self, Template, XLSX_CONTENT_TYPE};

use super::{ApiErr, AppState, dto::ImportResponse};

// ---------- uploads ----------

pub async fn import_employees(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>), ApiErr> {
    import_with(&state, multipart, &EmployeeRows).await
}

pub async fn import_orders(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>), ApiErr> {
    import_with(&state, multipart, &OrderRows).await
}

async fn import_with<I: RowImporter>(
    state: &AppState,
    multipart: Multipart,
    importer: &I,
) -> Result<(StatusCode, Json<ImportResponse>), ApiErr> {
    let (file_name, bytes) = read_upload(multipart).await?;
    tracing::info!(file = %file_name, size = bytes.len(), "import upload received");

    let sheet = Sheet::from_upload(&file_name, &bytes).map_err(import_err)?;
    let report = import::run_import(&state.db, &sheet, importer)
        .await
        .map_err(import_err)?;

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            message: format!(
                "{} {} imported successfully",
                report.inserted,
                importer.noun()
            ),
            inserted: report.inserted,
            errors: report.errors,
        }),
    ))
}

/// Pulls the `file` field out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiErr> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiErr::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        if file_name.is_empty() {
            return Err(ApiErr::bad_request("No file selected"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiErr::bad_request(e.body_text()))?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiErr::bad_request("No file uploaded"))
}

fn import_err(e: ImportError) -> ApiErr {
    if e.is_client_error() {
        ApiErr::bad_request(e.to_string())
    } else {
        ApiErr::internal(e)
    }
}

// ---------- templates ----------

pub async fn employee_template() -> Result<impl IntoResponse, ApiErr> {
    download(&template::EMPLOYEES)
}

pub async fn order_template() -> Result<impl IntoResponse, ApiErr> {
    download(&template::ORDERS)
}

fn download(template: &Template) -> Result<(HeaderMap, Vec<u8>), ApiErr> {
    let bytes = template.render().map_err(ApiErr::internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", template.file_name))
            .map_err(ApiErr::internal)?,
    );
    Ok((headers, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{read_json, send, send_request, setup_db};
    use crate::entity::{employee, production_order};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use sea_orm::{EntityTrait, PaginatorTrait};

    const BOUNDARY: &str = "tracker-test-boundary";

    fn multipart(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/import/orders")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn with_uri(mut req: Request<Body>, uri: &str) -> Request<Body> {
        *req.uri_mut() = uri.parse().unwrap();
        req
    }

    #[tokio::test]
    async fn csv_orders_import() {
        let db = setup_db().await;
        let csv = "OS;produto;estampa;quantidade;data_entrega;etapa\n\
                   1;Lencol;Liso;10;2025-03-01;Producao\n\
                   2;Fronha;Liso;5;2025-03-01;Lavanderia\n";

        let res = send_request(&db, multipart("file", "orders.csv", csv.as_bytes())).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: ImportResponse = read_json(res).await;
        assert_eq!(body.inserted, 1);
        assert_eq!(body.message, "1 orders imported successfully");
        assert_eq!(body.errors.len(), 1);
        assert!(body.errors[0].contains("Lavanderia"));
        assert_eq!(production_order::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn template_workbook_imports_employee() {
        let db = setup_db().await;
        // the example row names a stage that does not exist
        let bytes = template::EMPLOYEES.render().unwrap();

        let req = with_uri(multipart("file", "team.xlsx", &bytes), "/import/employees");
        let res = send_request(&db, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: ImportResponse = read_json(res).await;
        assert_eq!(body.inserted, 0);
        assert!(body.errors[0].contains("Nome da Etapa"));
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_column_rejects_batch() {
        let db = setup_db().await;
        let csv = "nome,etapa\nAna,Producao\n";

        let req = with_uri(multipart("file", "team.csv", csv.as_bytes()), "/import/employees");
        let res = send_request(&db, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(res).await;
        assert_eq!(
            body["error"],
            "The file must contain the columns: nome, etapa, producao_media"
        );
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let db = setup_db().await;

        let res = send_request(&db, multipart("file", "orders.txt", b"OS\n1\n")).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(res).await;
        assert_eq!(body["error"], "File type not allowed");
    }

    #[tokio::test]
    async fn rejects_missing_file_field() {
        let db = setup_db().await;

        let res = send_request(&db, multipart("attachment", "orders.csv", b"OS\n")).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(res).await;
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn rejects_empty_file_name() {
        let db = setup_db().await;

        let res = send_request(&db, multipart("file", "", b"")).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(res).await;
        assert_eq!(body["error"], "No file selected");
    }

    #[tokio::test]
    async fn corrupt_workbook_is_server_error() {
        let db = setup_db().await;

        let res = send_request(&db, multipart("file", "orders.xlsx", b"not a zip")).await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(production_order::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn template_download_headers() {
        let db = setup_db().await;

        let res = send(&db, Method::GET, "/template/orders", Body::empty()).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"template_orders.xlsx\""
        );
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let sheet = Sheet::from_workbook(&bytes).unwrap();
        sheet.require_columns(OrderRows::REQUIRED_COLUMNS).unwrap();
    }
}
