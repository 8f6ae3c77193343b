// Built-in workflow templates shipped with the platform

use serde_json::json;

use super::actions::WorkflowActionConfig;
use super::conditions::WorkflowCondition;
use super::store::CreateWorkflow;
use super::triggers::WorkflowTrigger;

/// Welcome workflow for new beneficiaries
pub fn beneficiary_welcome() -> CreateWorkflow {
    CreateWorkflow {
        name: "Yeni İhtiyaç Sahibi Karşılama".to_string(),
        description: "Yeni ihtiyaç sahibi kaydında otomatik görev oluştur".to_string(),
        trigger: WorkflowTrigger::BeneficiaryCreated,
        conditions: vec![WorkflowCondition::equals("status", json!("AKTIF"))],
        actions: vec![
            WorkflowActionConfig::create_task(
                "Yeni İhtiyaç Sahibini Görüşme",
                "Kayıt sonrası görüşme planla",
                "normal",
            ),
            WorkflowActionConfig::send_notification(
                "beneficiary_registered",
                "Yeni İhtiyaç Sahibi",
                "Yeni bir ihtiyaç sahibi kaydoldu: {{full_name}}",
            ),
        ],
    }
}

/// Thank-you receipt workflow for completed donations
pub fn donation_receipt() -> CreateWorkflow {
    CreateWorkflow {
        name: "Bağış Makbuzu Gönder".to_string(),
        description: "Bağış alındığında otomatik teşekkür mesajı gönder".to_string(),
        trigger: WorkflowTrigger::DonationReceived,
        conditions: vec![WorkflowCondition::equals("status", json!("completed"))],
        actions: vec![
            WorkflowActionConfig::send_email(
                "{{donor_email}}",
                "Bağışınız İçin Teşekkürler",
                "donation_receipt",
                json!({
                    "donor_name": "{{donor_name}}",
                    "amount": "{{amount}}"
                }),
            ),
            WorkflowActionConfig::create_task(
                "Bağış Takibi",
                "Bağış sonrası takip işlemlerini yap",
                "low",
            ),
        ],
    }
}

/// Reminder workflow for tasks nearing their due date
pub fn task_deadline_reminder() -> CreateWorkflow {
    CreateWorkflow {
        name: "Görev Son Gün Hatırlatması".to_string(),
        description: "Görev son günü yaklaştığında hatırlatma gönder".to_string(),
        trigger: WorkflowTrigger::DeadlineApproaching,
        conditions: vec![WorkflowCondition::less_than("days_until_due", 2.0)],
        actions: vec![
            WorkflowActionConfig::send_notification(
                "deadline_reminder",
                "Görev Son Günü Yaklaşıyor",
                "{{title}} görevinin son günü {{due_date}}",
            ),
            WorkflowActionConfig::send_email(
                "{{assignee_email}}",
                "Görev Hatırlatması: {{title}}",
                "task_reminder",
                json!({
                    "title": "{{title}}",
                    "due_date": "{{due_date}}"
                }),
            ),
        ],
    }
}

/// Review workflow for newly submitted aid applications
pub fn aid_application_review() -> CreateWorkflow {
    CreateWorkflow {
        name: "Yardım Başvurusu Değerlendirme".to_string(),
        description: "Yeni yardım başvurusu için değerlendirme görevi oluştur".to_string(),
        trigger: WorkflowTrigger::AidApplicationSubmitted,
        conditions: vec![WorkflowCondition::equals("stage", json!("draft"))],
        actions: vec![
            WorkflowActionConfig::create_task(
                "Yardım Başvurusu Değerlendir",
                "Yardım başvurusunu incele ve karar ver",
                "high",
            ),
            WorkflowActionConfig::move_to_stage("under_review"),
            WorkflowActionConfig::send_notification(
                "aid_application",
                "Yeni Yardım Başvurusu",
                "Yeni bir yardım başvurusu değerlendirme bekliyor",
            ),
        ],
    }
}

pub fn all() -> Vec<CreateWorkflow> {
    vec![
        beneficiary_welcome(),
        donation_receipt(),
        task_deadline_reminder(),
        aid_application_review(),
    ]
}
