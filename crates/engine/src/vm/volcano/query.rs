// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cell::{Cell, RefCell},
	fmt::{Display, Formatter},
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};

use quarry_core::{Row, Schema};
use quarry_type::{
	Type,
	error::diagnostic::internal::{internal, node_not_found, node_reentered},
	return_error,
};

use crate::{
	context::ExecutionContext,
	expression::{ExpressionCompiler, Scope},
	vm::volcano::{
		aggregate::AggregateNode,
		assert::AssertNode,
		compute::ComputeNode,
		concat::ConcatNode,
		distinct::DistinctNode,
		filter::FilterNode,
		join::{merge::MergeJoinNode, nested_loop::NestedLoopNode},
		project::ProjectNode,
		scan::{constant::ConstantScanNode, native::NativeQueryNode, remote::RemoteScanNode},
		sort::SortNode,
		spool::{
			adaptive::AdaptiveIndexSpoolNode, consumer::SpoolConsumerNode, index::IndexSpoolNode,
			stack::StackSpoolNode, table::TableSpoolNode,
		},
		top::TopNode,
		try_catch::TryCatchNode,
		window::WindowNode,
	},
};

/// Volcano style iterator contract of every operator.
pub(crate) trait QueryNode {
	/// (Re)starts the operator. Called once per execution, possibly many
	/// times per statement when the operator sits under a nested loop.
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()>;

	/// Next output row; `None` once exhausted.
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>>;
}

/// Handle of an operator inside its [`ExecutionPlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

pub(crate) enum QueryPlan {
	Aggregate(AggregateNode),
	AdaptiveIndexSpool(AdaptiveIndexSpoolNode),
	Assert(AssertNode),
	Compute(ComputeNode),
	Concatenate(ConcatNode),
	ConstantScan(ConstantScanNode),
	Distinct(DistinctNode),
	Filter(FilterNode),
	IndexSpool(IndexSpoolNode),
	MergeJoin(MergeJoinNode),
	NativeQuery(NativeQueryNode),
	NestedLoop(NestedLoopNode),
	Project(ProjectNode),
	RemoteScan(RemoteScanNode),
	Sort(SortNode),
	SpoolConsumer(SpoolConsumerNode),
	StackSpool(StackSpoolNode),
	TableSpool(TableSpoolNode),
	Top(TopNode),
	TryCatch(TryCatchNode),
	Window(WindowNode),
}

impl QueryPlan {
	pub(crate) fn name(&self) -> &'static str {
		match self {
			QueryPlan::Aggregate(_) => "aggregate",
			QueryPlan::AdaptiveIndexSpool(_) => "adaptive index spool",
			QueryPlan::Assert(_) => "assert",
			QueryPlan::Compute(_) => "compute scalar",
			QueryPlan::Concatenate(_) => "concatenation",
			QueryPlan::ConstantScan(_) => "constant scan",
			QueryPlan::Distinct(_) => "distinct",
			QueryPlan::Filter(_) => "filter",
			QueryPlan::IndexSpool(_) => "index spool",
			QueryPlan::MergeJoin(_) => "merge join",
			QueryPlan::NativeQuery(_) => "native query",
			QueryPlan::NestedLoop(_) => "nested loop",
			QueryPlan::Project(_) => "project",
			QueryPlan::RemoteScan(_) => "remote scan",
			QueryPlan::Sort(_) => "sort",
			QueryPlan::SpoolConsumer(_) => "spool consumer",
			QueryPlan::StackSpool(_) => "stack spool",
			QueryPlan::TableSpool(_) => "table spool",
			QueryPlan::Top(_) => "top",
			QueryPlan::TryCatch(_) => "try catch",
			QueryPlan::Window(_) => "window",
		}
	}
}

impl QueryNode for QueryPlan {
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		match self {
			QueryPlan::Aggregate(node) => node.initialize(plan, ctx),
			QueryPlan::AdaptiveIndexSpool(node) => node.initialize(plan, ctx),
			QueryPlan::Assert(node) => node.initialize(plan, ctx),
			QueryPlan::Compute(node) => node.initialize(plan, ctx),
			QueryPlan::Concatenate(node) => node.initialize(plan, ctx),
			QueryPlan::ConstantScan(node) => node.initialize(plan, ctx),
			QueryPlan::Distinct(node) => node.initialize(plan, ctx),
			QueryPlan::Filter(node) => node.initialize(plan, ctx),
			QueryPlan::IndexSpool(node) => node.initialize(plan, ctx),
			QueryPlan::MergeJoin(node) => node.initialize(plan, ctx),
			QueryPlan::NativeQuery(node) => node.initialize(plan, ctx),
			QueryPlan::NestedLoop(node) => node.initialize(plan, ctx),
			QueryPlan::Project(node) => node.initialize(plan, ctx),
			QueryPlan::RemoteScan(node) => node.initialize(plan, ctx),
			QueryPlan::Sort(node) => node.initialize(plan, ctx),
			QueryPlan::SpoolConsumer(node) => node.initialize(plan, ctx),
			QueryPlan::StackSpool(node) => node.initialize(plan, ctx),
			QueryPlan::TableSpool(node) => node.initialize(plan, ctx),
			QueryPlan::Top(node) => node.initialize(plan, ctx),
			QueryPlan::TryCatch(node) => node.initialize(plan, ctx),
			QueryPlan::Window(node) => node.initialize(plan, ctx),
		}
	}

	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		match self {
			QueryPlan::Aggregate(node) => node.next(plan, ctx),
			QueryPlan::AdaptiveIndexSpool(node) => node.next(plan, ctx),
			QueryPlan::Assert(node) => node.next(plan, ctx),
			QueryPlan::Compute(node) => node.next(plan, ctx),
			QueryPlan::Concatenate(node) => node.next(plan, ctx),
			QueryPlan::ConstantScan(node) => node.next(plan, ctx),
			QueryPlan::Distinct(node) => node.next(plan, ctx),
			QueryPlan::Filter(node) => node.next(plan, ctx),
			QueryPlan::IndexSpool(node) => node.next(plan, ctx),
			QueryPlan::MergeJoin(node) => node.next(plan, ctx),
			QueryPlan::NativeQuery(node) => node.next(plan, ctx),
			QueryPlan::NestedLoop(node) => node.next(plan, ctx),
			QueryPlan::Project(node) => node.next(plan, ctx),
			QueryPlan::RemoteScan(node) => node.next(plan, ctx),
			QueryPlan::Sort(node) => node.next(plan, ctx),
			QueryPlan::SpoolConsumer(node) => node.next(plan, ctx),
			QueryPlan::StackSpool(node) => node.next(plan, ctx),
			QueryPlan::TableSpool(node) => node.next(plan, ctx),
			QueryPlan::Top(node) => node.next(plan, ctx),
			QueryPlan::TryCatch(node) => node.next(plan, ctx),
			QueryPlan::Window(node) => node.next(plan, ctx),
		}
	}
}

struct Slot {
	node: RefCell<QueryPlan>,
	schema: Arc<Schema>,
	executions: Cell<usize>,
}

static NEXT_PLAN_ID: AtomicU64 = AtomicU64::new(1);

/// Arena owning the operators of one statement. Operators refer to their
/// children, and spool consumers to their producers, by [`NodeId`].
pub struct ExecutionPlan {
	id: u64,
	nodes: Vec<Slot>,
	pub(crate) compiler: ExpressionCompiler,
}

impl Default for ExecutionPlan {
	fn default() -> Self {
		Self::with_scope(Scope::default())
	}
}

impl ExecutionPlan {
	pub fn new() -> Self {
		Self::default()
	}

	/// A plan whose expressions see the variables and parameters declared in
	/// `scope`.
	pub fn with_scope(scope: Scope) -> Self {
		Self {
			id: NEXT_PLAN_ID.fetch_add(1, Ordering::Relaxed),
			nodes: Vec::new(),
			compiler: ExpressionCompiler::new(scope),
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn scope(&self) -> &Scope {
		self.compiler.scope()
	}

	pub fn declare_parameter(&mut self, name: &str, ty: Type) {
		self.compiler.scope_mut().declare_parameter(name, ty);
	}

	pub fn declare_variable(&mut self, name: &str, ty: Type) {
		self.compiler.scope_mut().declare_variable(name, ty);
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Handle the next pushed operator will get.
	pub(crate) fn next_id(&self) -> NodeId {
		NodeId(self.nodes.len())
	}

	pub(crate) fn push(&mut self, node: QueryPlan, schema: Schema) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Slot {
			node: RefCell::new(node),
			schema: Arc::new(schema),
			executions: Cell::new(0),
		});
		id
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> crate::Result<&mut QueryPlan> {
		match self.nodes.get_mut(id.0) {
			Some(slot) => Ok(slot.node.get_mut()),
			None => return_error!(node_not_found(id.0)),
		}
	}

	/// Runs `f` on the operator without starting it.
	pub(crate) fn inspect<R>(&self, id: NodeId, f: impl FnOnce(&QueryPlan) -> R) -> crate::Result<R> {
		let slot = self.slot(id)?;
		let node = slot.node.try_borrow().map_err(|_| quarry_type::error!(node_reentered(id.0)))?;
		Ok(f(&node))
	}

	fn slot(&self, id: NodeId) -> crate::Result<&Slot> {
		match self.nodes.get(id.0) {
			Some(slot) => Ok(slot),
			None => return_error!(node_not_found(id.0)),
		}
	}

	pub fn schema(&self, id: NodeId) -> crate::Result<&Schema> {
		Ok(&self.slot(id)?.schema)
	}

	pub(crate) fn schema_arc(&self, id: NodeId) -> crate::Result<Arc<Schema>> {
		Ok(self.slot(id)?.schema.clone())
	}

	/// How many times the operator has been (re)started.
	pub fn execution_count(&self, id: NodeId) -> crate::Result<usize> {
		Ok(self.slot(id)?.executions.get())
	}

	/// Operator kind, for diagnostics and plan validation.
	pub(crate) fn kind(&self, id: NodeId) -> crate::Result<&'static str> {
		self.inspect(id, QueryPlan::name)
	}

	/// Secondary input of a fallback operator.
	pub fn catch_source(&self, id: NodeId) -> crate::Result<Option<NodeId>> {
		self.inspect(id, |node| match node {
			QueryPlan::TryCatch(node) => Some(node.catch_source()),
			_ => None,
		})
	}

	/// Starts a new pass over the operator's output.
	pub fn execute(&self, id: NodeId, ctx: &mut ExecutionContext) -> crate::Result<()> {
		let slot = self.slot(id)?;
		let mut node = slot.node.try_borrow_mut().map_err(|_| quarry_type::error!(node_reentered(id.0)))?;
		slot.executions.set(slot.executions.get() + 1);
		node.initialize(self, ctx)
	}

	pub fn next(&self, id: NodeId, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let slot = self.slot(id)?;
		let mut node = slot.node.try_borrow_mut().map_err(|_| quarry_type::error!(node_reentered(id.0)))?;
		node.next(self, ctx)
	}

	/// Executes the operator and drains it.
	pub fn collect(&self, id: NodeId, ctx: &mut ExecutionContext) -> crate::Result<Vec<Row>> {
		self.execute(id, ctx)?;
		let mut rows = Vec::new();
		while let Some(row) = self.next(id, ctx)? {
			rows.push(row);
		}
		Ok(rows)
	}

	/// Cached output of an eager table spool, materialized on first use in
	/// the current execution.
	pub(crate) fn spool_rows(&self, producer: NodeId, ctx: &mut ExecutionContext) -> crate::Result<Arc<Vec<Row>>> {
		let slot = self.slot(producer)?;
		let mut node =
			slot.node.try_borrow_mut().map_err(|_| quarry_type::error!(node_reentered(producer.0)))?;
		match &mut *node {
			QueryPlan::TableSpool(spool) => spool.materialize(self, ctx),
			other => return_error!(internal(format!("{} {} is not a table spool", other.name(), producer))),
		}
	}
}
