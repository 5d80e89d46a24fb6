//! gRPC service implementation
//!
//! Implements the ExploreService trait generated from the proto definitions.

use std::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{error, info};

use cupid_domain::traits::EdgeStore;
use cupid_explore::{Decision, Explorer, ExploreError};

use crate::conversions::{cursor_from_proto, page_to_proto, status_from_error, user_id_from_proto};
use crate::proto::explore_service_server::ExploreService;
use crate::proto::*;

/// Implementation of the ExploreService
pub struct ExploreServiceImpl<S> {
    explorer: Explorer<S>,
    start_time: Instant,
}

impl<S> ExploreServiceImpl<S>
where
    S: EdgeStore + 'static,
{
    /// Create a new service instance
    pub fn new(explorer: Explorer<S>) -> Self {
        Self {
            explorer,
            start_time: Instant::now(),
        }
    }
}

fn failed(error: ExploreError) -> Status {
    let status = status_from_error(&error);
    error!(code = ?status.code(), error = %error, "request failed");
    status
}

#[tonic::async_trait]
impl<S> ExploreService for ExploreServiceImpl<S>
where
    S: EdgeStore + 'static,
{
    async fn list_liked_you(
        &self,
        request: Request<ListLikedYouRequest>,
    ) -> Result<Response<ListLikedYouResponse>, Status> {
        let req = request.into_inner();
        let recipient = user_id_from_proto("recipient_user_id", &req.recipient_user_id)?;
        let cursor = cursor_from_proto(req.pagination_token.as_deref())?;

        info!(recipient_id = %recipient, "retrieving list of all users that liked the user");

        let page = self
            .explorer
            .queries()
            .list_liked_you(recipient, cursor)
            .await
            .map_err(failed)?;

        info!(
            recipient_id = %recipient,
            returned = page.actors.len(),
            "successfully retrieved list of all users that liked the user"
        );
        Ok(Response::new(page_to_proto(page)))
    }

    async fn list_new_liked_you(
        &self,
        request: Request<ListLikedYouRequest>,
    ) -> Result<Response<ListLikedYouResponse>, Status> {
        let req = request.into_inner();
        let recipient = user_id_from_proto("recipient_user_id", &req.recipient_user_id)?;
        let cursor = cursor_from_proto(req.pagination_token.as_deref())?;

        info!(
            recipient_id = %recipient,
            "retrieving list of users that liked the user and are not matched yet"
        );

        let page = self
            .explorer
            .queries()
            .list_new_liked_you(recipient, cursor)
            .await
            .map_err(failed)?;

        info!(
            recipient_id = %recipient,
            returned = page.actors.len(),
            "successfully retrieved list of users that liked the user and are not matched yet"
        );
        Ok(Response::new(page_to_proto(page)))
    }

    async fn count_liked_you(
        &self,
        request: Request<CountLikedYouRequest>,
    ) -> Result<Response<CountLikedYouResponse>, Status> {
        let req = request.into_inner();
        let recipient = user_id_from_proto("recipient_user_id", &req.recipient_user_id)?;

        info!(recipient_id = %recipient, "retrieving count of users that liked the user");

        let count = self
            .explorer
            .queries()
            .count_liked_you(recipient)
            .await
            .map_err(failed)?;

        info!(recipient_id = %recipient, count, "successfully counted users that liked the user");
        Ok(Response::new(CountLikedYouResponse { count }))
    }

    async fn put_decision(
        &self,
        request: Request<PutDecisionRequest>,
    ) -> Result<Response<PutDecisionResponse>, Status> {
        let req = request.into_inner();
        let actor = user_id_from_proto("actor_user_id", &req.actor_user_id)?;
        let recipient = user_id_from_proto("recipient_user_id", &req.recipient_user_id)?;
        let decision = Decision::new(actor, recipient, req.liked_recipient)
            .map_err(|e| status_from_error(&e))?;

        info!(
            actor_id = %actor,
            recipient_id = %recipient,
            liked = req.liked_recipient,
            "recording decision"
        );

        let mutual_likes = self
            .explorer
            .decisions()
            .decide(decision)
            .await
            .map_err(failed)?;

        info!(
            actor_id = %actor,
            recipient_id = %recipient,
            mutual_likes,
            "successfully recorded decision"
        );
        Ok(Response::new(PutDecisionResponse { mutual_likes }))
    }

    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        Ok(Response::new(HealthCheckResponse {
            status: health_check_response::Status::Serving as i32,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }))
    }
}
