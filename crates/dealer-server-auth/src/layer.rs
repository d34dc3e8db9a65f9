// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route-level authorization layer.
//!
//! [`RequireCapability`] wraps any `tower` service taking `http::Request`s and
//! runs the [`RequestGuard`] before the inner service sees the request.
//!
//! # Security Properties
//!
//! - Unauthenticated requests are rejected with 401 Unauthorized
//! - Denied requests are rejected with 403 Forbidden
//! - An unregistered role is rejected with 500; the handler never runs
//! - Rejections carry an empty body and do not leak which check failed
//!
//! # Example
//!
//! ```ignore
//! use dealer_server_auth::{RequireCapability, TargetExtractor};
//!
//! Router::new()
//!     .route("/stores/{id}/users", post(create_store_user))
//!     .route_layer(
//!         RequireCapability::new(guard.clone(), "manage_users_own")
//!             .with_target(TargetExtractor::PathSegment(1)),
//!     );
//! ```

use std::{
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use http::{Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::error::AuthzError;
use crate::guard::{RequestGuard, Requirement};
use crate::middleware::{AuthContext, TargetExtractor};

/// Route layer requiring a capability.
#[derive(Debug, Clone)]
pub struct RequireCapability {
	guard: Arc<RequestGuard>,
	capability: Arc<str>,
	target: TargetExtractor,
}

impl RequireCapability {
	/// Create a new capability requirement with no target store.
	pub fn new(guard: Arc<RequestGuard>, capability: impl AsRef<str>) -> Self {
		Self {
			guard,
			capability: Arc::from(capability.as_ref()),
			target: TargetExtractor::None,
		}
	}

	/// Builder: where to find the target store.
	pub fn with_target(mut self, target: TargetExtractor) -> Self {
		self.target = target;
		self
	}
}

impl<S> Layer<S> for RequireCapability {
	type Service = RequireCapabilityService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RequireCapabilityService {
			inner,
			guard: self.guard.clone(),
			capability: self.capability.clone(),
			target: self.target.clone(),
		}
	}
}

/// Service wrapper for [`RequireCapability`] layer.
#[derive(Debug, Clone)]
pub struct RequireCapabilityService<S> {
	inner: S,
	guard: Arc<RequestGuard>,
	capability: Arc<str>,
	target: TargetExtractor,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequireCapabilityService<S>
where
	S: Service<Request<ReqBody>, Response = Response<ResBody>>,
	ResBody: Default,
{
	type Response = Response<ResBody>;
	type Error = S::Error;
	type Future = RequireCapabilityFuture<S::Future, ResBody>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
		let auth_ctx = req
			.extensions()
			.get::<AuthContext>()
			.cloned()
			.unwrap_or_else(AuthContext::unauthenticated);

		let requirement = Requirement::new(&*self.capability)
			.with_target(self.target.extract(req.uri(), req.headers()));

		match self.guard.check(&auth_ctx, &requirement) {
			Ok(()) => RequireCapabilityFuture::Inner {
				fut: self.inner.call(req),
			},
			Err(err) => {
				tracing::debug!(
					path = %req.uri().path(),
					capability = %self.capability,
					status = %err.status_code(),
					"route rejected"
				);
				RequireCapabilityFuture::Rejected {
					resp: Some(rejection(&err)),
				}
			}
		}
	}
}

fn rejection<B: Default>(err: &AuthzError) -> Response<B> {
	let mut resp = Response::new(B::default());
	*resp.status_mut() = err.status_code();
	resp
}

pin_project! {
	/// Future for [`RequireCapabilityService`].
	#[project = RequireCapabilityFutureProj]
	pub enum RequireCapabilityFuture<F, B> {
		Inner { #[pin] fut: F },
		Rejected { resp: Option<Response<B>> },
	}
}

impl<F, B, E> Future for RequireCapabilityFuture<F, B>
where
	F: Future<Output = Result<Response<B>, E>>,
{
	type Output = Result<Response<B>, E>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match self.project() {
			RequireCapabilityFutureProj::Inner { fut } => fut.poll(cx),
			RequireCapabilityFutureProj::Rejected { resp } => {
				Poll::Ready(Ok(resp.take().expect("polled after completion")))
			}
		}
	}
}
