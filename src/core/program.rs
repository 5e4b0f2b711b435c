//! Order queue and the running/stopped state machine.

use log::info;
use rand::Rng;

use super::errors::ConfigError;
use super::parameters::ProcessParameterSet;
use super::types::{ProductionOrder, ProgramState};

/// Result of moving past a completed order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAdvance {
    /// The next order is running; carries its queue index
    Started(usize),
    /// No orders left
    QueueExhausted,
}

#[derive(Debug, Clone)]
pub struct ProductionProgram {
    orders: Vec<ProductionOrder>,
    current_order_index: usize,
    accumulated_mass_total: f64,
    partial_mass: f64,
    state: ProgramState,
    parameters: ProcessParameterSet,
    machine_width: f64,
    exhausted: bool,
}

impl ProductionProgram {
    /// Validate the queue and start the first order
    pub fn new<R: Rng + ?Sized>(
        orders: Vec<ProductionOrder>,
        machine_width: f64,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        if orders.is_empty() {
            return Err(ConfigError::EmptyOrderQueue);
        }
        for (index, order) in orders.iter().enumerate() {
            order.validate(index)?;
        }

        let parameters = ProcessParameterSet::for_order(&orders[0], machine_width, rng);
        let program = Self {
            orders,
            current_order_index: 0,
            accumulated_mass_total: 0.0,
            partial_mass: 0.0,
            state: ProgramState::Running,
            parameters,
            machine_width,
            exhausted: false,
        };
        program.log_order_start();
        Ok(program)
    }

    /// Enter `Running` for the current order with a fresh operating point
    pub fn start_order<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let order = &self.orders[self.current_order_index];
        self.parameters = ProcessParameterSet::for_order(order, self.machine_width, rng);
        self.state = ProgramState::Running;
        self.log_order_start();
    }

    fn log_order_start(&self) {
        let order = self.current_order();
        info!(
            "starting order {}: {} at {} g/m2, target {:.0} kg, wire {:.2} m/s, consistency {:.2}%",
            self.current_order_index + 1,
            order.product,
            order.target_basis_weight,
            order.target_mass,
            self.parameters.line_speed.value,
            self.parameters.stock_consistency.value * 100.0
        );
    }

    /// Credit a tick of production.
    ///
    /// The completion check runs before `delta` is added: once the partial
    /// mass has reached the target, the next finished reel stops the order
    /// and `delta` is dropped.
    pub fn absorb_mass(&mut self, delta: f64, reel_complete: bool) {
        if self.state != ProgramState::Running {
            return;
        }

        if self.partial_mass >= self.current_order().target_mass && reel_complete {
            self.state = ProgramState::Stopped;
            self.partial_mass = 0.0;
            info!(
                "order {} ({}) complete",
                self.current_order_index + 1,
                self.current_order().product
            );
        } else {
            self.partial_mass += delta;
            self.accumulated_mass_total += delta;
        }
    }

    /// Move to the next order, or report that the queue is done
    pub fn advance_to_next_order<R: Rng + ?Sized>(&mut self, rng: &mut R) -> OrderAdvance {
        if self.current_order_index + 1 >= self.orders.len() {
            self.exhausted = true;
            return OrderAdvance::QueueExhausted;
        }
        self.current_order_index += 1;
        self.start_order(rng);
        OrderAdvance::Started(self.current_order_index)
    }

    /// Current order completion in %, capped at 100
    pub fn order_progress_percent(&self) -> f64 {
        let target = self.current_order().target_mass;
        if target <= 0.0 {
            return 0.0;
        }
        (100.0 * self.partial_mass / target).min(100.0)
    }

    pub fn current_order(&self) -> &ProductionOrder {
        &self.orders[self.current_order_index]
    }

    pub fn current_order_index(&self) -> usize {
        self.current_order_index
    }

    pub fn orders(&self) -> &[ProductionOrder] {
        &self.orders
    }

    pub fn accumulated_mass_total(&self) -> f64 {
        self.accumulated_mass_total
    }

    pub fn partial_mass(&self) -> f64 {
        self.partial_mass
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn parameters(&self) -> &ProcessParameterSet {
        &self.parameters
    }

    /// True once every order has been completed
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ProductKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn program(orders: Vec<ProductionOrder>) -> ProductionProgram {
        let mut rng = StdRng::seed_from_u64(1);
        ProductionProgram::new(orders, 2.75, &mut rng).unwrap()
    }

    #[test]
    fn test_empty_queue_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = ProductionProgram::new(vec![], 2.75, &mut rng).unwrap_err();
        assert_eq!(err, ConfigError::EmptyOrderQueue);
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let orders = vec![
            ProductionOrder::new(ProductKind::Tissue, 17.0, 1_000.0),
            ProductionOrder::new(ProductKind::Towel, 0.0, 1_000.0),
        ];
        let err = ProductionProgram::new(orders, 2.75, &mut rng).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBasisWeight {
                order_index: 1,
                value: 0.0
            }
        );
    }

    #[test]
    fn test_starts_running() {
        let program = program(vec![ProductionOrder::new(ProductKind::Tissue, 17.0, 1_000.0)]);
        assert_eq!(program.state(), ProgramState::Running);
        assert_eq!(program.current_order_index(), 0);
        assert_eq!(program.parameters().additives.len(), 1);
    }

    #[test]
    fn test_order_stops_on_reel_completion_after_target() {
        let mut program = program(vec![ProductionOrder::new(ProductKind::Tissue, 17.0, 10.0)]);

        program.absorb_mass(6.0, false);
        program.absorb_mass(6.0, false);
        assert_eq!(program.partial_mass(), 12.0);
        assert_eq!(program.state(), ProgramState::Running);

        // target is met but the reel keeps going: mass is still credited
        program.absorb_mass(2.0, false);
        assert_eq!(program.partial_mass(), 14.0);

        program.absorb_mass(2.0, true);
        assert_eq!(program.state(), ProgramState::Stopped);
        assert_eq!(program.partial_mass(), 0.0);
        assert_eq!(program.accumulated_mass_total(), 14.0);
    }

    #[test]
    fn test_reel_completion_below_target_keeps_running() {
        let mut program = program(vec![ProductionOrder::new(ProductKind::Tissue, 17.0, 10.0)]);
        program.absorb_mass(4.0, true);
        assert_eq!(program.state(), ProgramState::Running);
        assert_eq!(program.partial_mass(), 4.0);
    }

    #[test]
    fn test_stopped_program_ignores_mass() {
        let mut program = program(vec![ProductionOrder::new(ProductKind::Tissue, 17.0, 1.0)]);
        program.absorb_mass(2.0, false);
        program.absorb_mass(0.0, true);
        program.absorb_mass(5.0, false);
        assert_eq!(program.accumulated_mass_total(), 2.0);
    }

    #[test]
    fn test_advance_through_queue() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut program = program(vec![
            ProductionOrder::new(ProductKind::Tissue, 17.0, 1.0),
            ProductionOrder::new(ProductKind::Towel, 28.0, 1.0),
        ]);
        program.absorb_mass(2.0, false);
        program.absorb_mass(0.0, true);
        assert_eq!(program.advance_to_next_order(&mut rng), OrderAdvance::Started(1));
        assert_eq!(program.state(), ProgramState::Running);
        assert_eq!(program.current_order().product, ProductKind::Towel);
        assert_eq!(program.parameters().refining_grade.value, 60.0);

        program.absorb_mass(2.0, false);
        program.absorb_mass(0.0, true);
        assert_eq!(program.advance_to_next_order(&mut rng), OrderAdvance::QueueExhausted);
        assert!(program.is_exhausted());
        assert_eq!(program.accumulated_mass_total(), 4.0);
    }

    #[test]
    fn test_progress_percent() {
        let mut program = program(vec![ProductionOrder::new(ProductKind::Napkin, 15.0, 200.0)]);
        assert_eq!(program.order_progress_percent(), 0.0);
        program.absorb_mass(50.0, false);
        assert_eq!(program.order_progress_percent(), 25.0);
        program.absorb_mass(500.0, false);
        assert_eq!(program.order_progress_percent(), 100.0);
    }
}
