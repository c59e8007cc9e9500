//! Route handlers

use super::extract::Principal;
use super::response::{ApiError, ApiResponse, ApiResult};
use crate::error::ServiceError;
use crate::lifecycle::CreationStep;
use crate::path::Branch;
use crate::service::{DirectoryService, GroupSummary, OrganizationSummary};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<DirectoryService>,
    /// Header carrying the requesting principal's uid
    pub principal_header: String,
}

impl ApiState {
    pub fn new(service: Arc<DirectoryService>, principal_header: impl Into<String>) -> Self {
        Self {
            service,
            principal_header: principal_header.into().to_ascii_lowercase(),
        }
    }
}

/// Build the API router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/branches/{branch}/organizations",
            get(list_organizations).post(create_organization),
        )
        .route(
            "/branches/{branch}/organizations/{org}/subOrg",
            post(create_sub_organization),
        )
        .route(
            "/branches/{branch}/organizations/{org}/admins",
            post(add_org_admin).delete(remove_org_admin),
        )
        .route(
            "/branches/{branch}/organizations/{org}/reconcile",
            post(reconcile_organization),
        )
        .route(
            "/branches/{branch}/groups",
            get(list_groups).post(create_group),
        )
        .route(
            "/branches/{branch}/groups/{group}/admins",
            post(add_group_admin).delete(remove_group_admin),
        )
        .route(
            "/branches/{branch}/groups/{group}/members",
            get(group_members)
                .post(add_group_member)
                .delete(remove_group_member),
        )
        .route(
            "/branches/{branch}/groups/{group}/reconcile",
            post(reconcile_group),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn branch(raw: &str) -> Result<Branch, ApiError> {
    raw.parse::<Branch>()
        .map_err(|e| ApiError(ServiceError::InvalidPath(e)))
}

fn arg(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct ListOrganizationsQuery {
    pub name: Option<String>,
    #[serde(default)]
    pub nested: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNameQuery {
    pub org_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubOrgQuery {
    pub sub_org_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuery {
    pub admin_uid: Option<String>,
    pub org_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberQuery {
    pub member_uid: Option<String>,
    pub org_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupQuery {
    pub group_name: Option<String>,
    pub org_name: Option<String>,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_organizations(
    State(state): State<ApiState>,
    principal: Principal,
    Path(raw_branch): Path<String>,
    Query(query): Query<ListOrganizationsQuery>,
) -> ApiResult<Vec<OrganizationSummary>> {
    let orgs = state
        .service
        .list_organizations(
            principal.as_str(),
            branch(&raw_branch)?,
            query.name.as_deref(),
            query.nested,
        )
        .await?;
    Ok((
        StatusCode::OK,
        ApiResponse::success("Organizations retrieved successfully", orgs),
    ))
}

async fn create_organization(
    State(state): State<ApiState>,
    principal: Principal,
    Path(raw_branch): Path<String>,
    Query(query): Query<OrgNameQuery>,
) -> ApiResult<OrganizationSummary> {
    let org = state
        .service
        .create_organization(principal.as_str(), branch(&raw_branch)?, arg(&query.org_name))
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Organization created successfully", org),
    ))
}

async fn create_sub_organization(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, org)): Path<(String, String)>,
    Query(query): Query<SubOrgQuery>,
) -> ApiResult<OrganizationSummary> {
    let sub = state
        .service
        .create_sub_organization(
            principal.as_str(),
            branch(&raw_branch)?,
            &org,
            arg(&query.sub_org_name),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Sub-organization created successfully", sub),
    ))
}

async fn add_org_admin(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, org)): Path<(String, String)>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<()> {
    state
        .service
        .add_org_admin(principal.as_str(), branch(&raw_branch)?, &org, arg(&query.admin_uid))
        .await?;
    Ok((StatusCode::OK, ApiResponse::ok("Organization admin added successfully")))
}

async fn remove_org_admin(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, org)): Path<(String, String)>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<()> {
    state
        .service
        .remove_org_admin(principal.as_str(), branch(&raw_branch)?, &org, arg(&query.admin_uid))
        .await?;
    Ok((StatusCode::OK, ApiResponse::ok("Organization admin removed successfully")))
}

async fn reconcile_organization(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, org)): Path<(String, String)>,
) -> ApiResult<Vec<String>> {
    let created = state
        .service
        .reconcile_organization(principal.as_str(), branch(&raw_branch)?, &org)
        .await?;
    Ok((
        StatusCode::OK,
        ApiResponse::success("Organization reconciled", step_names(&created)),
    ))
}

async fn list_groups(
    State(state): State<ApiState>,
    principal: Principal,
    Path(raw_branch): Path<String>,
) -> ApiResult<Vec<GroupSummary>> {
    let groups = state
        .service
        .list_groups(principal.as_str(), branch(&raw_branch)?)
        .await?;
    Ok((
        StatusCode::OK,
        ApiResponse::success("Groups retrieved successfully", groups),
    ))
}

async fn create_group(
    State(state): State<ApiState>,
    principal: Principal,
    Path(raw_branch): Path<String>,
    Query(query): Query<CreateGroupQuery>,
) -> ApiResult<GroupSummary> {
    let group = state
        .service
        .create_group(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            arg(&query.group_name),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Group created successfully", group),
    ))
}

async fn add_group_admin(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, group)): Path<(String, String)>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<()> {
    state
        .service
        .add_group_admin(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            &group,
            arg(&query.admin_uid),
        )
        .await?;
    Ok((StatusCode::OK, ApiResponse::ok("Group admin added successfully")))
}

async fn remove_group_admin(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, group)): Path<(String, String)>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<()> {
    state
        .service
        .remove_group_admin(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            &group,
            arg(&query.admin_uid),
        )
        .await?;
    Ok((StatusCode::OK, ApiResponse::ok("Group admin removed successfully")))
}

async fn group_members(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, group)): Path<(String, String)>,
    Query(query): Query<OrgNameQuery>,
) -> ApiResult<GroupSummary> {
    let group = state
        .service
        .group_members(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            &group,
        )
        .await?;
    Ok((
        StatusCode::OK,
        ApiResponse::success("Group members retrieved successfully", group),
    ))
}

async fn add_group_member(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, group)): Path<(String, String)>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<()> {
    state
        .service
        .add_group_member(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            &group,
            arg(&query.member_uid),
        )
        .await?;
    Ok((StatusCode::OK, ApiResponse::ok("Group member added successfully")))
}

async fn remove_group_member(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, group)): Path<(String, String)>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<()> {
    state
        .service
        .remove_group_member(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            &group,
            arg(&query.member_uid),
        )
        .await?;
    Ok((StatusCode::OK, ApiResponse::ok("Group member removed successfully")))
}

async fn reconcile_group(
    State(state): State<ApiState>,
    principal: Principal,
    Path((raw_branch, group)): Path<(String, String)>,
    Query(query): Query<OrgNameQuery>,
) -> ApiResult<Vec<String>> {
    let created = state
        .service
        .reconcile_group(
            principal.as_str(),
            branch(&raw_branch)?,
            arg(&query.org_name),
            &group,
        )
        .await?;
    Ok((
        StatusCode::OK,
        ApiResponse::success("Group reconciled", step_names(&created)),
    ))
}

fn step_names(steps: &[CreationStep]) -> Vec<String> {
    steps.iter().map(|step| step.to_string()).collect()
}
