//! One specification build: resolve every route's handler, then assemble.
//!
//! Handler resolution (identity, annotations, fallbacks) runs on a pool of
//! scoped worker threads sharing one [`SourceCache`]. Assembly happens
//! afterwards on the calling thread, in route order, so the document does not
//! depend on how the work was scheduled.

use crate::annotations::{AnnotationParser, HandlerInfo};
use crate::config::GeneratorConfig;
use crate::descriptor::RouteInfo;
use crate::error::{Error, Result};
use crate::heuristics::apply_fallbacks;
use crate::identity::resolve;
use crate::openapi_builder::{convert_path_format, OpenApiBuilder, OpenApiDocument};
use crate::source_cache::SourceCache;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Builds OpenAPI documents from registered routes.
pub struct SpecGenerator {
    config: GeneratorConfig,
}

impl SpecGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Builds the document for `routes`.
    ///
    /// # Errors
    ///
    /// Returns the first route-level failure in route order, wrapped in
    /// [`Error::Route`]. No partial document is produced.
    pub fn build(&self, routes: &[RouteInfo]) -> Result<OpenApiDocument> {
        info!("Building OpenAPI document for {} routes", routes.len());

        // Scoped to this build and dropped with it
        let cache = SourceCache::new();
        let handlers = self.resolve_all(&cache, routes);
        debug!("Source cache holds {} units", cache.len());

        let mut builder = OpenApiBuilder::new().with_info(
            self.config.title.clone(),
            self.config.version.clone(),
            self.config.description.clone(),
        );

        for (route, handler) in routes.iter().zip(handlers) {
            let handler =
                handler.map_err(|e| e.at_route(route.method.as_str(), convert_path_format(&route.path)))?;
            builder.add_route(route, handler)?;
        }

        Ok(builder.build())
    }

    /// Resolves every route's [`HandlerInfo`], keeping route order.
    fn resolve_all(&self, cache: &SourceCache, routes: &[RouteInfo]) -> Vec<Result<HandlerInfo>> {
        let workers = self.config.worker_count(routes.len());
        debug!("Resolving handlers on {} workers", workers);

        let parser = AnnotationParser::new(cache, self.config.source_root.clone())
            .strict(self.config.strict_annotations);
        let next = AtomicUsize::new(0);
        let (parser, next) = (&parser, &next);

        let mut resolved: Vec<(usize, Result<HandlerInfo>)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(route) = routes.get(index) else {
                                break;
                            };
                            done.push((index, self.resolve_handler(parser, route)));
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(done) => done,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        resolved.sort_by_key(|(index, _)| *index);
        resolved.into_iter().map(|(_, handler)| handler).collect()
    }

    /// Identity, annotations and fallbacks for one route.
    fn resolve_handler(&self, parser: &AnnotationParser<'_>, route: &RouteInfo) -> Result<HandlerInfo> {
        let identity = match resolve(&route.handler) {
            Ok(identity) => identity,
            Err(Error::Resolution(name)) => {
                warn!(
                    "Cannot resolve handler `{}` of {} {}; using defaults",
                    name, route.method, route.path
                );
                return Ok(HandlerInfo::default());
            }
            Err(e) => return Err(e),
        };

        let annotated = parser.annotate(&identity)?;
        if annotated.declaration.is_none() {
            if self.config.strict_source {
                return Err(Error::SourceNotFound {
                    symbol: identity.qualified_name,
                });
            }
            warn!(
                "No source found for {}; documenting {} {} from its name only",
                identity.qualified_name, route.method, route.path
            );
        }

        let mut info = annotated.info;
        apply_fallbacks(&mut info, &identity, annotated.declaration.as_ref());
        Ok(info)
    }
}
