use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::Error;
use crate::model::MethodStep;

/// Method step dependencies resolved from step numbers to indices into the
/// step slice.
#[derive(Debug)]
pub struct StepGraph {
    numbers: Vec<u32>,
    depends_on: Vec<Vec<usize>>,
}

impl StepGraph {
    /// Rejects references to unknown steps and dependency cycles (including a
    /// step depending on itself).
    pub fn build(steps: &[MethodStep]) -> Result<Self, Error> {
        let index: HashMap<u32, usize> = steps
            .iter()
            .enumerate()
            .map(|(i, s)| (s.step_number, i))
            .collect();

        let mut depends_on = Vec::with_capacity(steps.len());
        for step in steps {
            let mut deps = Vec::with_capacity(step.dependencies.len());
            for dep in &step.dependencies {
                let Some(&target) = index.get(dep) else {
                    return Err(Error::InvalidInput(format!(
                        "step {} depends on unknown step {dep}",
                        step.step_number
                    )));
                };
                if !deps.contains(&target) {
                    deps.push(target);
                }
            }
            depends_on.push(deps);
        }

        let graph = StepGraph {
            numbers: steps.iter().map(|s| s.step_number).collect(),
            depends_on,
        };
        if let Some(cycle) = graph.find_cycle() {
            return Err(Error::DependencyCycle(cycle));
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn dependencies(&self, index: usize) -> &[usize] {
        &self.depends_on[index]
    }

    pub fn step_number(&self, index: usize) -> u32 {
        self.numbers[index]
    }

    /// Topological order, lowest index first among ready steps, so steps
    /// without dependencies keep their numbered order.
    pub fn execution_order(&self) -> Vec<usize> {
        let n = self.numbers.len();
        let mut remaining: Vec<usize> = self.depends_on.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, deps) in self.depends_on.iter().enumerate() {
            for &d in deps {
                dependents[d].push(i);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| remaining[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &next in &dependents[i] {
                remaining[next] -= 1;
                if remaining[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        order
    }

    /// Steps that depend on a step numbered after them. Legal, but worth a
    /// warning since the document is read in number order.
    pub fn forward_references(&self) -> Vec<(u32, u32)> {
        self.depends_on
            .iter()
            .enumerate()
            .flat_map(|(i, deps)| {
                deps.iter()
                    .filter(move |&&d| d > i)
                    .map(move |&d| (self.numbers[i], self.numbers[d]))
            })
            .collect()
    }

    fn find_cycle(&self) -> Option<Vec<u32>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            OnPath,
            Done,
        }

        let n = self.numbers.len();
        let mut marks = vec![Mark::New; n];
        let mut path: Vec<usize> = Vec::new();

        for start in 0..n {
            if marks[start] != Mark::New {
                continue;
            }
            // Explicit stack of (node, next dependency to visit).
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            marks[start] = Mark::OnPath;
            path.push(start);

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                if let Some(&dep) = self.depends_on[node].get(top.1) {
                    top.1 += 1;
                    match marks[dep] {
                        Mark::New => {
                            marks[dep] = Mark::OnPath;
                            path.push(dep);
                            stack.push((dep, 0));
                        }
                        Mark::OnPath => {
                            let pos = path.iter().position(|&p| p == dep).unwrap_or(0);
                            return Some(path[pos..].iter().map(|&i| self.numbers[i]).collect());
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    path.pop();
                    stack.pop();
                }
            }
        }
        None
    }
}
