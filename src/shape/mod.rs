/// Core engine: group-key extraction, grouping specification, and the
/// aggregation/normalization orchestrator.
///
/// ```text
///   ┌──────────┐    ┌───────────┐    ┌──────────┐
///   │ extract   │ ←─ │ groupby    │ ←─ │ engine    │
///   │ ts → key  │    │ ordered    │    │ add_groups│
///   └──────────┘    │ dimensions │    │ loadshape │
///                   └───────────┘    │ normalize │
///                                    └──────────┘
/// ```
pub mod engine;
pub mod extract;
pub mod groupby;
