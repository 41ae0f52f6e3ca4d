//! Attribute resolution engine
//!
//! Runs the passes in order over a measure's libraries:
//!
//! 1. collect relevant statements from the dependency map
//! 2. register value set names of every library
//! 3. index aliases and classify each relevant statement
//! 4. flatten union memberships into root bindings
//! 5. extract attribute triples from property accesses
//!
//! The result is an [`Analysis`], which can be inspected or attached to
//! source data criteria.

use indexmap::IndexMap;
use log::{debug, info, trace};
use octofhir_cqm_diagnostics::{CQM0201, CqmError, Result};
use octofhir_cqm_elm::ElmDocument;
use serde::{Deserialize, Serialize};

use crate::attacher::{self, AnnotationReport};
use crate::catalog::AttributeCatalog;
use crate::classifier::classify_statement;
use crate::context::{Classification, ResolutionContext, RootBinding};
use crate::criteria::SourceDataCriteria;
use crate::dependencies::{DependencyMap, RelevantStatements};
use crate::measure::MeasureInput;
use crate::properties::{AttributeTriple, PropertyWalker};
use crate::valuesets::ValueSetTable;

/// Engine options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Substring marking a criterion description as negated
    pub negation_marker: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            negation_marker: "Not".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|e| CqmError::config(CQM0201, format!("Invalid engine configuration: {}", e)))
    }

    pub fn with_negation_marker(mut self, marker: impl Into<String>) -> Self {
        self.negation_marker = marker.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttributeEngine {
    catalog: AttributeCatalog,
    config: EngineConfig,
}

impl AttributeEngine {
    pub fn new(catalog: AttributeCatalog) -> Self {
        Self {
            catalog,
            config: EngineConfig::default(),
        }
    }

    /// Engine over the built-in QDM attribute catalog
    pub fn qdm() -> Self {
        Self::new(AttributeCatalog::qdm())
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze the relevant statements of a set of libraries
    pub fn analyze<'a>(&self, libraries: &'a [ElmDocument], dependencies: &DependencyMap) -> Analysis<'a> {
        let mut ctx = ResolutionContext::new(RelevantStatements::from_dependencies(dependencies));

        for doc in libraries {
            ctx.value_sets.register_library(&doc.library);
        }

        for doc in libraries {
            let library = doc.library.id();
            for def in doc.library.statements() {
                if !ctx.relevant.contains(library, &def.name) {
                    trace!("skipping {}.{}: not in the dependency map", library, def.name);
                    continue;
                }
                ctx.aliases.index_statement(library, def);
                let shape = classify_statement(&mut ctx, library, def);
                debug!("{}.{} classified as {:?}", library, def.name, shape);
            }
        }

        ctx.flatten_unions();

        let mut triples = Vec::new();
        for doc in libraries {
            let library = doc.library.id();
            for def in doc.library.statements() {
                if ctx.relevant.contains(library, &def.name) {
                    triples.extend(PropertyWalker::walk(&ctx.aliases, library, def));
                }
            }
        }

        info!(
            "analyzed {} relevant statements in {} libraries: {} root criteria, {} attribute accesses",
            ctx.relevant.len(),
            libraries.len(),
            ctx.root.len(),
            triples.len()
        );

        Analysis { context: ctx, triples }
    }

    /// Analyze a measure and attach the discovered attributes to its
    /// source data criteria
    pub fn annotate(&self, measure: &mut MeasureInput) -> AnnotationReport {
        let analysis = self.analyze(&measure.libraries, &measure.dependencies);
        let report = analysis.attach(&mut measure.source_data_criteria, &self.catalog, &self.config);
        info!(
            "attached {} attributes from {} accesses ({} skipped)",
            report.attached,
            report.triples,
            report.skipped.len()
        );
        report
    }
}

/// Result of analyzing a measure's libraries
#[derive(Debug)]
pub struct Analysis<'a> {
    context: ResolutionContext<'a>,
    triples: Vec<AttributeTriple>,
}

impl<'a> Analysis<'a> {
    pub fn context(&self) -> &ResolutionContext<'a> {
        &self.context
    }

    pub fn triples(&self) -> &[AttributeTriple] {
        &self.triples
    }

    pub fn attach(
        &self,
        criteria: &mut SourceDataCriteria,
        catalog: &AttributeCatalog,
        config: &EngineConfig,
    ) -> AnnotationReport {
        attacher::attach(&self.triples, &self.context, criteria, catalog, &config.negation_marker)
    }

    /// Snapshot of the resolution tables for reporting
    pub fn report(&self) -> AnalysisReport {
        let ctx = &self.context;
        let resolved: IndexMap<String, Vec<String>> = ctx
            .root
            .keys()
            .chain(ctx.non_root.keys())
            .map(|name| (name.clone(), ctx.resolve_value_sets(name).into_iter().collect()))
            .collect();

        AnalysisReport {
            relevant_statements: ctx.relevant.clone(),
            value_sets: ctx.value_sets.clone(),
            classifications: ctx.classifications.clone(),
            root_criteria: ctx.root.clone(),
            non_root_criteria: ctx.non_root.clone(),
            unions: ctx.unions().clone(),
            statement_sources: ctx.statement_sources.clone(),
            alias_sources: ctx.alias_sources.clone(),
            resolved_value_sets: resolved,
            triples: self.triples.clone(),
        }
    }
}

/// Owned, serializable view of an [`Analysis`]
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub relevant_statements: RelevantStatements,
    pub value_sets: ValueSetTable,
    pub classifications: Vec<Classification>,
    pub root_criteria: IndexMap<String, RootBinding>,
    pub non_root_criteria: IndexMap<String, Vec<String>>,
    pub unions: IndexMap<String, Vec<String>>,
    pub statement_sources: IndexMap<String, IndexMap<String, Vec<String>>>,
    pub alias_sources: IndexMap<String, IndexMap<String, IndexMap<String, String>>>,
    /// Criteria name -> value set identifiers it resolves to
    pub resolved_value_sets: IndexMap<String, Vec<String>>,
    pub triples: Vec<AttributeTriple>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        assert_eq!(EngineConfig::default().negation_marker, "Not");
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
        assert_eq!(
            EngineConfig::from_json_str(r#"{"negation_marker": "Negated"}"#).unwrap(),
            EngineConfig::default().with_negation_marker("Negated")
        );
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let err = EngineConfig::from_json_str(r#"{"marker": "Not"}"#).unwrap_err();
        assert_eq!(err.code(), CQM0201);
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = AttributeEngine::qdm().analyze(&[], &DependencyMap::new());
        assert!(analysis.triples().is_empty());
        assert!(analysis.report().root_criteria.is_empty());
    }
}
