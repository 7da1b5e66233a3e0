// src/records/field.rs

/// Sheet columns the portal reads by name.
///
/// The variants mirror the sanitized header cells of the order sheet. A column
/// that is not listed here is still reachable through
/// [`Record::column`](super::Record::column).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CustomerName,
    CustomerId,
    Mobile,
    ModelText,
    ModelSeries,
    InvoiceNumber,
    VehicleId,
    Color,
    InteriorColor,
    ModelLine,
    Transmission,
    FuelType,
    Channel,
    MainOutlet,
    FinanceMode,
    ApplicationStatus,
    DocumentDate,
    TotalVehicleValue,
    BranchName,
    EmployeeName,
}

impl Field {
    pub const COUNT: usize = 20;

    pub const ALL: [Field; Field::COUNT] = [
        Field::CustomerName,
        Field::CustomerId,
        Field::Mobile,
        Field::ModelText,
        Field::ModelSeries,
        Field::InvoiceNumber,
        Field::VehicleId,
        Field::Color,
        Field::InteriorColor,
        Field::ModelLine,
        Field::Transmission,
        Field::FuelType,
        Field::Channel,
        Field::MainOutlet,
        Field::FinanceMode,
        Field::ApplicationStatus,
        Field::DocumentDate,
        Field::TotalVehicleValue,
        Field::BranchName,
        Field::EmployeeName,
    ];

    /// Sanitized header text this field is read from.
    pub fn key(self) -> &'static str {
        match self {
            Field::CustomerName => "CustomerName",
            Field::CustomerId => "Customer",
            Field::Mobile => "Mobile",
            Field::ModelText => "ModelText1",
            Field::ModelSeries => "ModelSeries",
            Field::InvoiceNumber => "Invoicenumber",
            Field::VehicleId => "VehicleIDNo",
            Field::Color => "Color",
            Field::InteriorColor => "InteriorColorDescription",
            Field::ModelLine => "ModelLineDescription",
            Field::Transmission => "TransmissiontypeDescription",
            Field::FuelType => "FuelTypeDescription",
            Field::Channel => "Channel",
            Field::MainOutlet => "MainOutletName",
            Field::FinanceMode => "FinanceMode",
            Field::ApplicationStatus => "ApplicationStatus",
            Field::DocumentDate => "DocumentDate",
            Field::TotalVehicleValue => "TotalVehicleValue",
            Field::BranchName => "BranchName",
            Field::EmployeeName => "EmployeeName",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}
