// In-memory telemetry store seeded with the machine's demo data
use crate::application::channels::PushMessage;
use crate::application::feed::{FeedTarget, RandomWalk};
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::alert::{EventKind, EventLogItem};
use crate::domain::entity::{MonitoredEntity, SensorDelta, SensorKind, Status};
use crate::domain::motor::{MotorDelta, MotorNode, MotorStatus, Zone};
use crate::domain::telemetry::{
    ChartPoint, CuttingTelemetry, FilterStatus, HistorySample, HydraulicTelemetry, MetricCard, OilTank,
    PressureData, SystemData, Temperatures,
};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::sync::RwLock;

const CHART_WINDOW: usize = 10;
const CHART_SPACING_SECS: i64 = 2;

const PRESSURE_MAIN_WALK: RandomWalk = RandomWalk::new(0.0, 160.0, 1.0);
const PRESSURE_RETURN_WALK: RandomWalk = RandomWalk::new(0.0, 60.0, 0.5);
const TEMPERATURE_WALK: RandomWalk = RandomWalk::new(20.0, 100.0, 0.25);
const TANK_WALK: RandomWalk = RandomWalk::new(10.0, 95.0, 0.5);
const FLOW_RATE_WALK: RandomWalk = RandomWalk::new(30.0, 60.0, 1.0);
const EFFICIENCY_WALK: RandomWalk = RandomWalk::new(70.0, 95.0, 0.5);
const OPERATING_HOURS_PER_TICK: f64 = 0.01;

/// Per-tick sensor drift as a fraction of the sensor's magnitude
const SENSOR_DRIFT: f64 = 0.02;
/// Sensors never wander further than this fraction from their seed value
const SENSOR_BAND: f64 = 0.2;

const MOTOR_TEMP_WALK: RandomWalk = RandomWalk::new(40.0, 100.0, 0.5);

/// Chance per tick that the machine logs a new event
const EVENT_CHANCE: f64 = 0.1;
const EVENT_LOG_CAP: usize = 100;
const EVENT_TEMPLATES: &[(&str, EventKind)] = &[
    ("Lectura de sensores sincronizada", EventKind::Info),
    ("Ciclo de lubricación completado", EventKind::Info),
    ("Cambio de anillo de dovelas registrado", EventKind::Info),
    ("Vibración elevada en cabeza de corte", EventKind::Warning),
    ("Presión de lodos fuera de rango", EventKind::Warning),
    ("Temperatura de motor sobre el umbral", EventKind::Warning),
    ("Pérdida de comunicación con nodo de motor", EventKind::Error),
];

/// Drift bands for one motor, same order as `motors`
#[derive(Debug, Clone, Copy)]
struct MotorWalks {
    rpm: RandomWalk,
    current_a: RandomWalk,
}

struct MockState {
    sensors: Vec<MonitoredEntity>,
    /// One walk per sensor, same order as `sensors`
    walks: Vec<RandomWalk>,
    cutting: CuttingTelemetry,
    hydraulic: HydraulicTelemetry,
    events: Vec<EventLogItem>,
    metrics: Vec<MetricCard>,
    chart: VecDeque<ChartPoint>,
    motors: Vec<MotorNode>,
    motor_walks: Vec<MotorWalks>,
    next_event_id: u64,
}

pub struct MockTelemetryStore {
    state: RwLock<MockState>,
}

impl MockTelemetryStore {
    /// Store holding the demo sensors, event log and subsystem snapshots.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let mut rng = StdRng::from_os_rng();
        let chart = (0..CHART_WINDOW)
            .map(|i| {
                let back = (CHART_WINDOW - 1 - i) as i64 * CHART_SPACING_SECS;
                random_chart_point(&mut rng, now - chrono::Duration::seconds(back))
            })
            .collect();

        Self::with_sensors(demo_sensors()).with_chart(chart)
    }

    /// Store with the given sensors and the demo subsystem data, empty chart.
    pub fn with_sensors(sensors: Vec<MonitoredEntity>) -> Self {
        let walks = sensors.iter().map(|s| sensor_walk(s.value)).collect();
        let motors = demo_motors();
        let motor_walks = motors
            .iter()
            .map(|m| MotorWalks {
                rpm: sensor_walk(m.rpm),
                current_a: sensor_walk(m.current_a),
            })
            .collect();
        let events = demo_events();
        let next_event_id = events.len() as u64 + 1;
        Self {
            state: RwLock::new(MockState {
                sensors,
                walks,
                cutting: demo_cutting(),
                hydraulic: demo_hydraulic(),
                events,
                metrics: demo_metrics(),
                chart: VecDeque::new(),
                motors,
                motor_walks,
                next_event_id,
            }),
        }
    }

    fn with_chart(self, chart: VecDeque<ChartPoint>) -> Self {
        let mut state = self.state.into_inner();
        state.chart = chart;
        Self {
            state: RwLock::new(state),
        }
    }
}

/// Walk bounded to a band around `seed`. Zero-valued sensors stay put.
fn sensor_walk(seed: f64) -> RandomWalk {
    let magnitude = seed.abs();
    RandomWalk::new(
        seed - magnitude * SENSOR_BAND,
        seed + magnitude * SENSOR_BAND,
        magnitude * SENSOR_DRIFT,
    )
}

fn random_chart_point<R: Rng>(rng: &mut R, time: DateTime<Utc>) -> ChartPoint {
    ChartPoint {
        time,
        presion: rng.random_range(25.0..125.0),
        torque: rng.random_range(20.0..100.0),
        velocidad: rng.random_range(30.0..150.0),
        temperatura: rng.random_range(10.0..100.0),
    }
}

fn history_seed(id: &str, from: DateTime<Utc>) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    from.timestamp().hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl TelemetrySource for MockTelemetryStore {
    async fn list_sensors(&self) -> anyhow::Result<Vec<MonitoredEntity>> {
        Ok(self.state.read().await.sensors.clone())
    }

    async fn sensor(&self, id: &str) -> anyhow::Result<Option<MonitoredEntity>> {
        let state = self.state.read().await;
        Ok(state.sensors.iter().find(|s| s.id == id).cloned())
    }

    async fn sensor_history(
        &self,
        id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        step: Duration,
    ) -> anyhow::Result<Vec<HistorySample>> {
        let state = self.state.read().await;
        let Some(idx) = state.sensors.iter().position(|s| s.id == id) else {
            anyhow::bail!("unknown sensor '{}'", id);
        };
        let walk = state.walks[idx];
        let mut value = state.sensors[idx].value;
        drop(state);

        let step = chrono::Duration::from_std(step)?;
        if step <= chrono::Duration::zero() {
            anyhow::bail!("history step must be positive");
        }

        // Same id and start always replay the same curve
        let mut rng = StdRng::seed_from_u64(history_seed(id, from));
        let mut samples = Vec::new();
        let mut time = from;
        while time < to {
            samples.push(HistorySample::new(time, value));
            value = walk.step(value, &mut rng);
            match time.checked_add_signed(step) {
                Some(next) => time = next,
                None => break,
            }
        }
        Ok(samples)
    }

    async fn cutting_snapshot(&self) -> anyhow::Result<CuttingTelemetry> {
        Ok(self.state.read().await.cutting.clone())
    }

    async fn hydraulic_snapshot(&self) -> anyhow::Result<HydraulicTelemetry> {
        Ok(self.state.read().await.hydraulic.clone())
    }

    async fn events(&self) -> anyhow::Result<Vec<EventLogItem>> {
        Ok(self.state.read().await.events.clone())
    }

    async fn dashboard_metrics(&self) -> anyhow::Result<Vec<MetricCard>> {
        Ok(self.state.read().await.metrics.clone())
    }

    async fn chart_window(&self) -> anyhow::Result<Vec<ChartPoint>> {
        Ok(self.state.read().await.chart.iter().cloned().collect())
    }

    async fn motor_nodes(&self) -> anyhow::Result<Vec<MotorNode>> {
        Ok(self.state.read().await.motors.clone())
    }
}

#[async_trait]
impl FeedTarget for MockTelemetryStore {
    async fn tick(&self, rng: &mut StdRng) -> Vec<PushMessage> {
        let now = Utc::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let mut updates = Vec::new();

        // Dashboard chart
        let point = random_chart_point(rng, now);
        if state.chart.len() >= CHART_WINDOW {
            state.chart.pop_front();
        }
        state.chart.push_back(point.clone());
        updates.push(PushMessage::ChartPoint(point));

        // Hydraulic circuit
        let h = &mut state.hydraulic;
        h.pressure.main = PRESSURE_MAIN_WALK.step(h.pressure.main, rng);
        h.pressure.return_line = PRESSURE_RETURN_WALK.step(h.pressure.return_line, rng);
        h.temperatures.inlet = TEMPERATURE_WALK.step(h.temperatures.inlet, rng);
        h.temperatures.outlet = TEMPERATURE_WALK.step(h.temperatures.outlet, rng);
        for tank in &mut h.tanks {
            tank.level_pct = TANK_WALK.step(tank.level_pct, rng);
        }
        h.system.flow_rate = FLOW_RATE_WALK.step(h.system.flow_rate, rng);
        h.system.efficiency = EFFICIENCY_WALK.step(h.system.efficiency, rng);
        h.system.operating_hours += OPERATING_HOURS_PER_TICK;
        updates.push(PushMessage::Hydraulic(Box::new(h.clone())));

        // Sensors: values drift, status is left alone
        for (sensor, walk) in state.sensors.iter_mut().zip(&state.walks) {
            if sensor.status() == Some(Status::Offline) {
                continue;
            }
            let delta = SensorDelta {
                id: sensor.id.clone(),
                value: walk.step(sensor.value, rng),
                status: None,
                updated_at: now,
            };
            sensor.apply(&delta);
            updates.push(PushMessage::SensorValue(delta));
            if sensor.is_alert() {
                updates.push(PushMessage::SensorAlert(sensor.clone()));
            }
        }

        // Motors: stopped (error) motors stay put
        for (motor, walks) in state.motors.iter_mut().zip(&state.motor_walks) {
            if motor.status == MotorStatus::Error {
                continue;
            }
            let delta = MotorDelta {
                id: motor.id.clone(),
                status: None,
                temp_c: Some(MOTOR_TEMP_WALK.step(motor.temp_c, rng)),
                rpm: Some(walks.rpm.step(motor.rpm, rng)),
                current_a: Some(walks.current_a.step(motor.current_a, rng)),
                updated_at: now,
            };
            motor.apply(&delta);
            updates.push(PushMessage::MotorNode(delta));
        }

        // Event log, newest first
        if rng.random_bool(EVENT_CHANCE) {
            let (description, kind) = EVENT_TEMPLATES[rng.random_range(0..EVENT_TEMPLATES.len())];
            let timestamp = now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
            let event = EventLogItem::new(&state.next_event_id.to_string(), &timestamp, description, kind);
            state.next_event_id += 1;
            state.events.insert(0, event.clone());
            state.events.truncate(EVENT_LOG_CAP);
            updates.push(PushMessage::Event(event));
        }

        updates
    }
}

fn demo_sensors() -> Vec<MonitoredEntity> {
    use SensorKind::*;
    use Status::*;

    vec![
        MonitoredEntity::new("advance-circuit-pressure", "Presión del circuito de avance", 180.0, "bar", Presion, Online),
        MonitoredEntity::new("cutting-head-pressure", "Presión en cabeza de corte", 1.2, "bar", Presion, Warning),
        MonitoredEntity::new("bentonite-pressure", "Presión inyección de bentonita", 3.5, "bar", Presion, Online),
        MonitoredEntity::new("hydraulic-oil-temp", "Temperatura aceite hidráulico", 75.0, "°C", Temperatura, Warning)
            .with_metric("hydraulic.temp_out"),
        MonitoredEntity::new("main-motor-temp", "Temperatura motor principal", 88.0, "°C", Temperatura, Online),
        MonitoredEntity::new("laser-horizontal", "Desviación horizontal (Láser)", -25.0, "mm", Posicion, Error),
        MonitoredEntity::new("laser-vertical", "Desviación vertical (Láser)", 8.0, "mm", Posicion, Online),
        MonitoredEntity::new("total-advance", "Avance total de la máquina", 122.5, "m", Posicion, Online),
        MonitoredEntity::new("cutting-head-speed", "Velocidad cabeza de corte", 5.0, "rpm", Rotacion, Online)
            .with_metric("cutting.rpm"),
        MonitoredEntity::new("motor-torque", "Par motor (Torque)", 75.0, "%", Rotacion, Warning),
        MonitoredEntity::new("slurry-flow", "Caudal de lodos (extracción)", 150.0, "m³/h", Caudal, Online)
            .with_metric("cutting.slurry_flow"),
        MonitoredEntity::new("methane", "Detector de Metano (CH4)", 1200.0, "ppm", Gas, Error),
        MonitoredEntity::new("oxygen", "Nivel de Oxígeno (O2)", 20.9, "%", Gas, Online),
        MonitoredEntity::new("carbon-monoxide", "Detector de Monóxido (CO)", 0.0, "ppm", Gas, Offline),
    ]
}

fn demo_events() -> Vec<EventLogItem> {
    use EventKind::*;

    [
        ("1", "2025-09-18 19:45:00", "Sistema iniciado correctamente", Info),
        ("2", "2025-09-18 19:42:15", "Conexión con PLC establecida", Info),
        ("3", "2025-09-18 19:40:30", "Fallo en comunicación con sensor de gas", Error),
        ("4", "2025-09-18 19:38:45", "Temperatura del motor elevada", Warning),
        ("5", "2025-09-18 19:35:20", "Mantenimiento programado completado", Info),
        ("6", "2025-09-18 19:32:10", "Presión del circuito fuera de rango", Warning),
        ("7", "2025-09-18 19:30:05", "Backup de datos realizado", Info),
        ("8", "2025-09-18 19:28:00", "Alerta de vibración excesiva", Warning),
        ("9", "2025-09-18 19:25:30", "Error en sensor de posición", Error),
        ("10", "2025-09-18 19:23:15", "Sistema de refrigeración activado", Info),
        ("11", "2025-09-18 19:20:45", "Presión hidráulica baja", Warning),
        ("12", "2025-09-18 19:18:20", "Calibración de sensores completada", Info),
        ("13", "2025-09-18 19:15:10", "Fallo crítico en motor principal", Error),
        ("14", "2025-09-18 19:12:35", "Temperatura de aceite elevada", Warning),
        ("15", "2025-09-18 19:10:00", "Inicio de secuencia de perforación", Info),
    ]
    .into_iter()
    .map(|(id, timestamp, description, kind)| EventLogItem::new(id, timestamp, description, kind))
    .collect()
}

fn demo_motors() -> Vec<MotorNode> {
    use MotorStatus as S;
    use Zone::*;

    [
        ("1", [774.0, 128.0], S::Ok, Front, 62.0, 1450.0, 18.2),
        ("2", [694.0, 131.0], S::Warn, Front, 82.0, 1520.0, 23.9),
        ("3", [720.0, 180.0], S::Error, Front, 96.0, 0.0, 0.0),
        ("4", [779.0, 126.0], S::Error, Front, 96.0, 0.0, 0.0),
        ("5", [754.0, 346.0], S::Ok, Middle, 58.0, 1300.0, 12.4),
        ("6", [701.0, 344.0], S::Ok, Middle, 58.0, 1300.0, 12.4),
        ("7", [760.0, 520.0], S::Ok, Rear, 54.0, 900.0, 7.8),
    ]
    .into_iter()
    .map(|(id, position, status, zone, temp_c, rpm, current_a)| MotorNode {
        id: id.to_string(),
        label: format!("Motor{id}"),
        position,
        status,
        zone,
        temp_c,
        rpm,
        current_a,
        updated_at: None,
    })
    .collect()
}

fn demo_metrics() -> Vec<MetricCard> {
    vec![
        MetricCard::new("Presion", 43.0, "Bar", 65.0),
        MetricCard::new("Velocidad", 0.1, "m/s", 0.5),
        MetricCard::new("Temperatura", 70.0, "C", 130.0),
        MetricCard::new("Torque", 20.0, "RPM", 50.0),
    ]
}

fn demo_cutting() -> CuttingTelemetry {
    CuttingTelemetry {
        rpm: 14.6,
        torque: 780.0,
        temperature: 68.3,
        wear_level: 32.0,
        advance_rate: 8.4,
        cutter_pressure: 95.0,
        vibration: 3.2,
        slurry_flow: 18.5,
        is_running: true,
    }
}

fn demo_hydraulic() -> HydraulicTelemetry {
    HydraulicTelemetry {
        pressure: PressureData {
            main: 72.6,
            return_line: 23.8,
        },
        temperatures: Temperatures {
            inlet: 37.6,
            outlet: 45.7,
        },
        tanks: vec![
            OilTank::new("main", "Tanque principal", 50.0, 1000.0),
            OilTank::new("aux", "Tanque auxiliar", 80.0, 1000.0),
            OilTank::new("res", "Reserva", 25.0, 1000.0),
        ],
        system: SystemData {
            flow_rate: 45.2,
            viscosity: 32.0,
            operating_hours: 1247.0,
            efficiency: 87.0,
            filter_status: FilterStatus::Ok,
            maintenance_alert: false,
        },
    }
}
